//! Product service: store, validation semantics and event consumer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Product;
use event_channel::{Event, EventReceiver, EventType};
use tokio::sync::RwLock;

use crate::error::{DuplicateKey, EventProcessingError, ServiceError};

/// Abstract product storage. One entity per product id, unique.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a product; rejects an already-present product id.
    async fn insert(&self, product: Product) -> Result<(), DuplicateKey>;

    /// Looks up the product for the given id.
    async fn find(&self, product_id: i32) -> Option<Product>;

    /// Removes the product for the given id, if present.
    async fn delete(&self, product_id: i32);
}

/// In-memory product store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    entries: Arc<RwLock<HashMap<i32, Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> Result<(), DuplicateKey> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&product.product_id) {
            return Err(DuplicateKey);
        }
        entries.insert(product.product_id, product);
        Ok(())
    }

    async fn find(&self, product_id: i32) -> Option<Product> {
        self.entries.read().await.get(&product_id).cloned()
    }

    async fn delete(&self, product_id: i32) {
        self.entries.write().await.remove(&product_id);
    }
}

/// The product service's own read/create/delete operations.
#[derive(Clone)]
pub struct ProductService<S: ProductStore> {
    store: S,
    origin_address: String,
}

impl<S: ProductStore> ProductService<S> {
    /// Creates the service; `origin_address` names this instance and is
    /// stamped on every entity it serves.
    pub fn new(store: S, origin_address: impl Into<String>) -> Self {
        Self {
            store,
            origin_address: origin_address.into(),
        }
    }

    #[tracing::instrument(skip(self, product), fields(product_id = product.product_id))]
    pub async fn create(&self, product: Product) -> Result<Product, ServiceError> {
        let product_id = product.product_id;
        self.store.insert(product.clone()).await.map_err(|_| {
            ServiceError::InvalidInput(format!("Duplicate key, Product Id: {product_id}"))
        })?;

        tracing::debug!(product_id, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, product_id: i32) -> Result<Product, ServiceError> {
        if product_id < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid productId: {product_id}"
            )));
        }

        let mut product = self.store.find(product_id).await.ok_or_else(|| {
            ServiceError::NotFound(format!("No product found for productId: {product_id}"))
        })?;
        product.origin_address = self.origin_address.clone();

        tracing::debug!(product_id, "product found");
        Ok(product)
    }

    /// Deleting a missing product is a no-op success.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        tracing::debug!(product_id, "deleting product");
        self.store.delete(product_id).await;
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the product channel.
///
/// Safe under at-least-once redelivery: a redelivered CREATE is rejected
/// by the uniqueness check, a redelivered DELETE is a no-op success.
pub struct ProductEventConsumer<S: ProductStore> {
    service: ProductService<S>,
}

impl<S: ProductStore> ProductEventConsumer<S> {
    pub fn new(service: ProductService<S>) -> Self {
        Self { service }
    }

    /// Applies one inbound event.
    pub async fn process(&self, event: Event) -> Result<(), EventProcessingError> {
        tracing::info!(
            event_type = %event.event_type,
            key = event.key,
            created_at = %event.event_created_at,
            "processing product event"
        );

        match event.event_type {
            EventType::Create => {
                let product: Product = event
                    .payload()?
                    .ok_or(EventProcessingError::MissingPayload(event.key))?;
                self.service.create(product).await?;
            }
            EventType::Delete => {
                self.service.delete(event.key).await?;
            }
        }

        metrics::counter!("events_processed_total").increment(1);
        Ok(())
    }

    /// Drains the channel until the producer side closes. Rejected events
    /// are logged for operator attention and do not stop the loop.
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            if let Err(error) = self.process(event).await {
                metrics::counter!("events_rejected_total").increment(1);
                tracing::error!(error = %error, "product event rejected");
            }
        }
        tracing::info!("product event channel closed, consumer stopping");
    }
}
