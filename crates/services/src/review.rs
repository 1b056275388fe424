//! Review service, same pattern as the recommendation service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Review;
use event_channel::{Event, EventReceiver, EventType};
use tokio::sync::RwLock;

use crate::error::{DuplicateKey, EventProcessingError, ServiceError};

/// Abstract review storage; identity is the (product id, review id) pair.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: Review) -> Result<(), DuplicateKey>;

    async fn find_by_product_id(&self, product_id: i32) -> Vec<Review>;

    async fn delete_by_product_id(&self, product_id: i32);
}

/// In-memory review store, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviewStore {
    entries: Arc<RwLock<HashMap<i32, Vec<Review>>>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn insert(&self, review: Review) -> Result<(), DuplicateKey> {
        let mut entries = self.entries.write().await;
        let bucket = entries.entry(review.product_id).or_default();
        if bucket.iter().any(|r| r.review_id == review.review_id) {
            return Err(DuplicateKey);
        }
        bucket.push(review);
        Ok(())
    }

    async fn find_by_product_id(&self, product_id: i32) -> Vec<Review> {
        self.entries
            .read()
            .await
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn delete_by_product_id(&self, product_id: i32) {
        self.entries.write().await.remove(&product_id);
    }
}

#[derive(Clone)]
pub struct ReviewService<S: ReviewStore> {
    store: S,
    origin_address: String,
}

impl<S: ReviewStore> ReviewService<S> {
    pub fn new(store: S, origin_address: impl Into<String>) -> Self {
        Self {
            store,
            origin_address: origin_address.into(),
        }
    }

    #[tracing::instrument(
        skip(self, review),
        fields(product_id = review.product_id, review_id = review.review_id)
    )]
    pub async fn create(&self, review: Review) -> Result<Review, ServiceError> {
        let product_id = review.product_id;
        let review_id = review.review_id;
        self.store.insert(review.clone()).await.map_err(|_| {
            ServiceError::InvalidInput(format!(
                "Duplicate key, Product Id: {product_id}, Review Id: {review_id}"
            ))
        })?;

        Ok(review)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, product_id: i32) -> Result<Vec<Review>, ServiceError> {
        if product_id < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid productId: {product_id}"
            )));
        }

        let mut list = self.store.find_by_product_id(product_id).await;
        for review in &mut list {
            review.origin_address = self.origin_address.clone();
        }

        tracing::debug!(size = list.len(), "reviews found");
        Ok(list)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        self.store.delete_by_product_id(product_id).await;
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the review channel.
pub struct ReviewEventConsumer<S: ReviewStore> {
    service: ReviewService<S>,
}

impl<S: ReviewStore> ReviewEventConsumer<S> {
    pub fn new(service: ReviewService<S>) -> Self {
        Self { service }
    }

    pub async fn process(&self, event: Event) -> Result<(), EventProcessingError> {
        tracing::info!(
            event_type = %event.event_type,
            key = event.key,
            "processing review event"
        );

        match event.event_type {
            EventType::Create => {
                let review: Review = event
                    .payload()?
                    .ok_or(EventProcessingError::MissingPayload(event.key))?;
                self.service.create(review).await?;
            }
            EventType::Delete => {
                self.service.delete(event.key).await?;
            }
        }

        metrics::counter!("events_processed_total").increment(1);
        Ok(())
    }

    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            if let Err(error) = self.process(event).await {
                metrics::counter!("events_rejected_total").increment(1);
                tracing::error!(error = %error, "review event rejected");
            }
        }
        tracing::info!("review event channel closed, consumer stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(product_id: i32, review_id: i32) -> Review {
        Review {
            product_id,
            review_id,
            author: "a".to_string(),
            rate: 4,
            content: "c".to_string(),
            origin_address: String::new(),
        }
    }

    #[tokio::test]
    async fn create_list_delete() {
        let store = InMemoryReviewStore::new();
        let service = ReviewService::new(store.clone(), "review/test:7003");

        service.create(review(1, 1)).await.unwrap();
        service.create(review(1, 2)).await.unwrap();

        let list = service.get(1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].origin_address, "review/test:7003");

        service.delete(1).await.unwrap();
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_review_id_is_rejected() {
        let service = ReviewService::new(InMemoryReviewStore::new(), "review/test");
        service.create(review(1, 1)).await.unwrap();

        let err = service.create(review(1, 1)).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidInput("Duplicate key, Product Id: 1, Review Id: 1".to_string())
        );
    }

    #[tokio::test]
    async fn get_rejects_non_positive_id() {
        let service = ReviewService::new(InMemoryReviewStore::new(), "review/test");
        let err = service.get(-1).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidInput("Invalid productId: -1".to_string())
        );
    }

    #[tokio::test]
    async fn consumer_is_idempotent_under_redelivery() {
        let store = InMemoryReviewStore::new();
        let consumer = ReviewEventConsumer::new(ReviewService::new(store.clone(), "review/test"));

        let event = Event::create(1, &review(1, 1)).unwrap();
        consumer.process(event.clone()).await.unwrap();
        assert!(consumer.process(event).await.is_err());
        assert_eq!(store.count().await, 1);

        consumer.process(Event::delete(1)).await.unwrap();
        consumer.process(Event::delete(1)).await.unwrap();
        assert_eq!(store.count().await, 0);
    }
}
