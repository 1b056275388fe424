use thiserror::Error;

/// A store rejected an insert because the identity already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duplicate key")]
pub struct DuplicateKey;

/// Errors surfaced by the owning services' read/create/delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Caller error: bad id or duplicate key on create.
    #[error("{0}")]
    InvalidInput(String),

    /// No entity for the requested id.
    #[error("{0}")]
    NotFound(String),
}

/// Fatal, non-retryable rejection of one inbound event.
///
/// These are surfaced to the channel's error handling (logged for
/// operator/dead-letter attention), never silently swallowed and never
/// retried automatically.
#[derive(Debug, Error)]
pub enum EventProcessingError {
    /// The event's data conflicts with stored state (duplicate key).
    #[error("{0}")]
    InvalidInput(String),

    /// The event payload did not decode into the service's entity shape.
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// A CREATE event arrived without a payload; contract violation.
    #[error("CREATE event for key {0} carried no payload")]
    MissingPayload(i32),
}

impl From<ServiceError> for EventProcessingError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) | ServiceError::NotFound(msg) => {
                EventProcessingError::InvalidInput(msg)
            }
        }
    }
}
