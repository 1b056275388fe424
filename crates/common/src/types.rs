use serde::{Deserialize, Serialize};

/// A product entity, owned exclusively by the product service.
///
/// `product_id` is a positive integer assigned externally; it is unique
/// within the product service. `origin_address` names the physical
/// instance that served the entity and is stamped by the owning service
/// on reads, never persisted as caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: i32,
    pub name: String,
    pub weight: i32,
    #[serde(default)]
    pub origin_address: String,
}

impl Product {
    pub fn new(product_id: i32, name: impl Into<String>, weight: i32) -> Self {
        Self {
            product_id,
            name: name.into(),
            weight,
            origin_address: String::new(),
        }
    }
}

/// A recommendation for a product.
///
/// Identity is the (`product_id`, `recommendation_id`) pair. The
/// `product_id` is a weak reference: recommendations outlive a delete
/// request for their product until the owning service processes the
/// corresponding DELETE event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: i32,
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
    #[serde(default)]
    pub origin_address: String,
}

/// A review for a product, same shape as [`Recommendation`] with its own
/// identity pair (`product_id`, `review_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub product_id: i32,
    pub review_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
    #[serde(default)]
    pub origin_address: String,
}
