//! Composite aggregation over the product, recommendation and review
//! services.
//!
//! The read path fans out to the three downstream services concurrently
//! through the resilient client and assembles one [`common::CompositeProduct`];
//! the write path splits an aggregate into per-resource commands and
//! dispatches each as an event on the owning service's channel.

pub mod error;
pub mod gateway;
pub mod orchestrator;

pub use error::CompositeError;
pub use gateway::{ProductGateway, RecommendationGateway, ReviewGateway};
pub use orchestrator::CompositeService;
