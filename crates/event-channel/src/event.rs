use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of event types a channel carries.
///
/// Deliberately a sum type: consumers match exhaustively, so adding a new
/// event type is a compile-time-checked change rather than a silent
/// default-case fallthrough. An unknown type on the wire fails decoding
/// and never reaches a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Create,
    Delete,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Create => write!(f, "CREATE"),
            EventType::Delete => write!(f, "DELETE"),
        }
    }
}

/// An immutable event envelope.
///
/// `key` is the routing and idempotence key — the product id for all three
/// streams. CREATE carries the full entity as JSON in `data`; DELETE
/// carries `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_type: EventType,
    pub key: i32,
    pub data: Option<serde_json::Value>,
    pub event_created_at: DateTime<Utc>,
}

impl Event {
    /// Builds a CREATE event carrying the full entity.
    pub fn create<T: Serialize>(key: i32, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: EventType::Create,
            key,
            data: Some(serde_json::to_value(data)?),
            event_created_at: Utc::now(),
        })
    }

    /// Builds a DELETE event with no payload.
    pub fn delete(key: i32) -> Self {
        Self {
            event_type: EventType::Delete,
            key,
            data: None,
            event_created_at: Utc::now(),
        }
    }

    /// Decodes the payload into the consumer's own entity shape, or
    /// `None` when the event carries no payload.
    pub fn payload<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(value) => serde_json::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entity {
        id: i32,
        name: String,
    }

    #[test]
    fn create_event_wire_shape() {
        let entity = Entity {
            id: 1,
            name: "n".to_string(),
        };
        let event = Event::create(1, &entity).unwrap();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "CREATE");
        assert_eq!(json["key"], 1);
        assert_eq!(json["data"]["name"], "n");
        assert!(json["eventCreatedAt"].is_string());
    }

    #[test]
    fn delete_event_carries_null_payload() {
        let event = Event::delete(7);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "DELETE");
        assert_eq!(json["key"], 7);
        assert!(json["data"].is_null());
    }

    #[test]
    fn payload_decodes_into_entity() {
        let entity = Entity {
            id: 2,
            name: "x".to_string(),
        };
        let event = Event::create(2, &entity).unwrap();

        let decoded: Option<Entity> = event.payload().unwrap();
        assert_eq!(decoded, Some(entity));
    }

    #[test]
    fn payload_is_none_for_delete() {
        let event = Event::delete(2);
        let decoded: Option<Entity> = event.payload().unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn unknown_event_type_fails_decoding() {
        let result: Result<Event, _> = serde_json::from_value(serde_json::json!({
            "eventType": "UPDATE",
            "key": 1,
            "data": null,
            "eventCreatedAt": "2024-01-01T00:00:00Z"
        }));
        assert!(result.is_err());
    }
}
