//! Recommendation service: store, validation semantics and event consumer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Recommendation;
use event_channel::{Event, EventReceiver, EventType};
use tokio::sync::RwLock;

use crate::error::{DuplicateKey, EventProcessingError, ServiceError};

/// Abstract recommendation storage. Identity is the
/// (product id, recommendation id) pair; many entries share a product id.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn insert(&self, recommendation: Recommendation) -> Result<(), DuplicateKey>;

    async fn find_by_product_id(&self, product_id: i32) -> Vec<Recommendation>;

    /// Removes every recommendation for the given product id.
    async fn delete_by_product_id(&self, product_id: i32);
}

/// In-memory recommendation store, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecommendationStore {
    entries: Arc<RwLock<HashMap<i32, Vec<Recommendation>>>>,
}

impl InMemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn insert(&self, recommendation: Recommendation) -> Result<(), DuplicateKey> {
        let mut entries = self.entries.write().await;
        let bucket = entries.entry(recommendation.product_id).or_default();
        if bucket
            .iter()
            .any(|r| r.recommendation_id == recommendation.recommendation_id)
        {
            return Err(DuplicateKey);
        }
        bucket.push(recommendation);
        Ok(())
    }

    async fn find_by_product_id(&self, product_id: i32) -> Vec<Recommendation> {
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
pub struct RecommendationService<S: RecommendationStore> {
    store: S,
    origin_address: String,
}

impl<S: RecommendationStore> RecommendationService<S> {
    pub fn new(store: S, origin_address: impl Into<String>) -> Self {
        Self {
            store,
            origin_address: origin_address.into(),
        }
    }

    #[tracing::instrument(
        skip(self, recommendation),
        fields(
            product_id = recommendation.product_id,
            recommendation_id = recommendation.recommendation_id
        )
    )]
    pub async fn create(
        &self,
        recommendation: Recommendation,
    ) -> Result<Recommendation, ServiceError> {
        let product_id = recommendation.product_id;
        let recommendation_id = recommendation.recommendation_id;
        self.store
            .insert(recommendation.clone())
            .await
            .map_err(|_| {
                ServiceError::InvalidInput(format!(
                    "Duplicate key, Product Id: {product_id}, Recommendation Id: {recommendation_id}"
                ))
            })?;

        Ok(recommendation)
    }

    /// Returns the (possibly empty) recommendation list for a product,
    /// stamped with this instance's address.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, product_id: i32) -> Result<Vec<Recommendation>, ServiceError> {
        if product_id < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid productId: {product_id}"
            )));
        }

        let mut list = self.store.find_by_product_id(product_id).await;
        for recommendation in &mut list {
            recommendation.origin_address = self.origin_address.clone();
        }

        tracing::debug!(size = list.len(), "recommendations found");
        Ok(list)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        self.store.delete_by_product_id(product_id).await;
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the recommendation channel.
pub struct RecommendationEventConsumer<S: RecommendationStore> {
    service: RecommendationService<S>,
}

impl<S: RecommendationStore> RecommendationEventConsumer<S> {
    pub fn new(service: RecommendationService<S>) -> Self {
        Self { service }
    }

    pub async fn process(&self, event: Event) -> Result<(), EventProcessingError> {
        tracing::info!(
            event_type = %event.event_type,
            key = event.key,
            "processing recommendation event"
        );

        match event.event_type {
            EventType::Create => {
                let recommendation: Recommendation = event
                    .payload()?
                    .ok_or(EventProcessingError::MissingPayload(event.key))?;
                self.service.create(recommendation).await?;
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
                tracing::error!(error = %error, "recommendation event rejected");
            }
        }
        tracing::info!("recommendation event channel closed, consumer stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(product_id: i32, recommendation_id: i32) -> Recommendation {
        Recommendation {
            product_id,
            recommendation_id,
            author: "a".to_string(),
            rate: 3,
            content: "c".to_string(),
            origin_address: String::new(),
        }
    }

    fn service(store: InMemoryRecommendationStore) -> RecommendationService<InMemoryRecommendationStore> {
        RecommendationService::new(store, "recommendation/test:7002")
    }

    #[tokio::test]
    async fn create_and_list_for_one_product() {
        let service = service(InMemoryRecommendationStore::new());
        service.create(recommendation(1, 1)).await.unwrap();
        service.create(recommendation(1, 2)).await.unwrap();
        service.create(recommendation(2, 1)).await.unwrap();

        let list = service.get(1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|r| r.origin_address == "recommendation/test:7002"));
    }

    #[tokio::test]
    async fn get_unknown_product_returns_empty_list() {
        let service = service(InMemoryRecommendationStore::new());
        assert!(service.get(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_identity_pair_is_rejected() {
        let service = service(InMemoryRecommendationStore::new());
        service.create(recommendation(1, 1)).await.unwrap();

        let err = service.create(recommendation(1, 1)).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidInput(
                "Duplicate key, Product Id: 1, Recommendation Id: 1".to_string()
            )
        );
    }

    #[tokio::test]
    async fn same_recommendation_id_under_other_product_is_fine() {
        let service = service(InMemoryRecommendationStore::new());
        service.create(recommendation(1, 1)).await.unwrap();
        service.create(recommendation(2, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_all_for_the_key() {
        let store = InMemoryRecommendationStore::new();
        let service = service(store.clone());
        service.create(recommendation(1, 1)).await.unwrap();
        service.create(recommendation(1, 2)).await.unwrap();

        service.delete(1).await.unwrap();
        assert_eq!(store.count().await, 0);

        // And again, idempotently.
        service.delete(1).await.unwrap();
    }

    #[tokio::test]
    async fn consumer_roundtrip() {
        let store = InMemoryRecommendationStore::new();
        let consumer = RecommendationEventConsumer::new(service(store.clone()));

        let event = Event::create(1, &recommendation(1, 1)).unwrap();
        consumer.process(event.clone()).await.unwrap();
        assert_eq!(store.count().await, 1);

        let err = consumer.process(event).await.unwrap_err();
        assert!(matches!(err, EventProcessingError::InvalidInput(_)));

        consumer.process(Event::delete(1)).await.unwrap();
        assert_eq!(store.count().await, 0);
    }
}
