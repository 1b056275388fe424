use serde::{Deserialize, Serialize};

use crate::types::{Recommendation, Review};

/// The aggregated read-path representation for one product id.
///
/// Assembled by the composite service, never persisted. On the write path
/// the same shape is accepted as input, with the summary lists defaulting
/// to empty and `service_addresses` absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeProduct {
    pub product_id: i32,
    pub name: String,
    pub weight: i32,
    #[serde(default)]
    pub recommendations: Vec<RecommendationSummary>,
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_addresses: Option<ServiceAddresses>,
}

/// Display subset of a [`Recommendation`]: identity plus display fields,
/// without the origin address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
}

impl From<&Recommendation> for RecommendationSummary {
    fn from(rec: &Recommendation) -> Self {
        Self {
            recommendation_id: rec.recommendation_id,
            author: rec.author.clone(),
            rate: rec.rate,
            content: rec.content.clone(),
        }
    }
}

/// Display subset of a [`Review`], same pattern as [`RecommendationSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub review_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
}

impl From<&Review> for ReviewSummary {
    fn from(review: &Review) -> Self {
        Self {
            review_id: review.review_id,
            author: review.author.clone(),
            rate: review.rate,
            content: review.content.clone(),
        }
    }
}

/// The physical instances that supplied data for one composite response.
///
/// Diagnostics only: each field is the `origin_address` reported by the
/// instance that answered, or an empty string if that leg produced no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddresses {
    pub composite: String,
    pub product: String,
    pub recommendation: String,
    pub review: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_body_defaults_lists_and_omits_addresses() {
        let body: CompositeProduct = serde_json::from_value(serde_json::json!({
            "productId": 1,
            "name": "n",
            "weight": 1
        }))
        .unwrap();

        assert!(body.recommendations.is_empty());
        assert!(body.reviews.is_empty());
        assert!(body.service_addresses.is_none());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("serviceAddresses").is_none());
        assert_eq!(json["recommendations"], serde_json::json!([]));
    }

    #[test]
    fn summary_drops_origin_address() {
        let rec = Recommendation {
            product_id: 1,
            recommendation_id: 7,
            author: "a".to_string(),
            rate: 5,
            content: "c".to_string(),
            origin_address: "rec-1:7002".to_string(),
        };

        let summary = RecommendationSummary::from(&rec);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["recommendationId"], 7);
        assert!(json.get("originAddress").is_none());
    }
}
