//! One gateway per owned resource type.
//!
//! Reads go through the resilient client; writes never touch the network —
//! they are dispatched as CREATE/DELETE events on the resource's channel.
//! `request_create`/`request_delete` return once the event is enqueued,
//! not once the owning service has applied it.

use std::sync::Arc;

use common::{Product, Recommendation, Review};
use event_channel::{Event, EventChannel};
use resilient::{DownstreamError, ResilientClient};

use crate::error::CompositeError;

/// Gateway to the product service.
pub struct ProductGateway {
    client: ResilientClient,
    channel: Arc<dyn EventChannel>,
}

impl ProductGateway {
    pub fn new(client: ResilientClient, channel: Arc<dyn EventChannel>) -> Self {
        Self { client, channel }
    }

    /// Fetches the single product for the id.
    pub async fn fetch(&self, product_id: i32) -> Result<Product, DownstreamError> {
        self.client.get_json(&format!("/product/{product_id}")).await
    }

    pub async fn request_create(&self, product: &Product) -> Result<(), CompositeError> {
        let event = Event::create(product.product_id, product)
            .map_err(event_channel::ChannelError::Encode)?;
        self.channel.publish(event).await?;
        Ok(())
    }

    pub async fn request_delete(&self, product_id: i32) -> Result<(), CompositeError> {
        self.channel.publish(Event::delete(product_id)).await?;
        Ok(())
    }
}

/// Gateway to the recommendation service.
pub struct RecommendationGateway {
    client: ResilientClient,
    channel: Arc<dyn EventChannel>,
}

impl RecommendationGateway {
    pub fn new(client: ResilientClient, channel: Arc<dyn EventChannel>) -> Self {
        Self { client, channel }
    }

    /// Fetches the (possibly empty) recommendation list for the product.
    pub async fn fetch(&self, product_id: i32) -> Result<Vec<Recommendation>, DownstreamError> {
        self.client
            .get_json(&format!("/recommendation?productId={product_id}"))
            .await
    }

    pub async fn request_create(
        &self,
        recommendation: &Recommendation,
    ) -> Result<(), CompositeError> {
        let event = Event::create(recommendation.product_id, recommendation)
            .map_err(event_channel::ChannelError::Encode)?;
        self.channel.publish(event).await?;
        Ok(())
    }

    pub async fn request_delete(&self, product_id: i32) -> Result<(), CompositeError> {
        self.channel.publish(Event::delete(product_id)).await?;
        Ok(())
    }
}

/// Gateway to the review service.
pub struct ReviewGateway {
    client: ResilientClient,
    channel: Arc<dyn EventChannel>,
}

impl ReviewGateway {
    pub fn new(client: ResilientClient, channel: Arc<dyn EventChannel>) -> Self {
        Self { client, channel }
    }

    /// Fetches the (possibly empty) review list for the product.
    pub async fn fetch(&self, product_id: i32) -> Result<Vec<Review>, DownstreamError> {
        self.client
            .get_json(&format!("/review?productId={product_id}"))
            .await
    }

    pub async fn request_create(&self, review: &Review) -> Result<(), CompositeError> {
        let event = Event::create(review.product_id, review)
            .map_err(event_channel::ChannelError::Encode)?;
        self.channel.publish(event).await?;
        Ok(())
    }

    pub async fn request_delete(&self, product_id: i32) -> Result<(), CompositeError> {
        self.channel.publish(Event::delete(product_id)).await?;
        Ok(())
    }
}
