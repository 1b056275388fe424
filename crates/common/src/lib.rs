//! Shared domain types for the product composite system.
//!
//! These are the wire-level entity shapes exchanged between the composite
//! service and the three owning services (product, recommendation, review),
//! plus the aggregated read-path representation.

pub mod composite;
pub mod types;

pub use composite::{CompositeProduct, RecommendationSummary, ReviewSummary, ServiceAddresses};
pub use types::{Product, Recommendation, Review};
