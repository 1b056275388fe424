//! Entity layer and event consumers for the three owning services.
//!
//! Each resource (product, recommendation, review) gets a store trait with
//! an in-memory implementation, a service enforcing the resource's
//! validation and uniqueness semantics, and an event consumer that applies
//! CREATE/DELETE events from the resource's channel idempotently.
//!
//! Persistence proper is out of scope: the store traits are the seam where
//! a real datastore would plug in.

pub mod error;
pub mod product;
pub mod recommendation;
pub mod review;

pub use error::{DuplicateKey, EventProcessingError, ServiceError};
pub use product::{InMemoryProductStore, ProductEventConsumer, ProductService, ProductStore};
pub use recommendation::{
    InMemoryRecommendationStore, RecommendationEventConsumer, RecommendationService,
    RecommendationStore,
};
pub use review::{InMemoryReviewStore, ReviewEventConsumer, ReviewService, ReviewStore};
