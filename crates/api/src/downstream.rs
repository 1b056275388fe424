//! In-process transports binding the resilient clients to the owning
//! services.
//!
//! Each transport answers the same paths a networked deployment of the
//! owning service would, rendering the service result as a raw HTTP-shaped
//! response. The resilient client stays unaware that no network is
//! involved, so its timeout, retry and breaker behavior is identical in
//! both deployments.

use async_trait::async_trait;
use axum::http::StatusCode;
use resilient::{RawResponse, Transport, TransportError};
use serde::Serialize;
use services::error::ServiceError;
use services::product::{InMemoryProductStore, ProductService};
use services::recommendation::{InMemoryRecommendationStore, RecommendationService};
use services::review::{InMemoryReviewStore, ReviewService};

use crate::error::HttpErrorInfo;

/// Serves `/product/{productId}`.
pub struct ProductTransport {
    service: ProductService<InMemoryProductStore>,
}

impl ProductTransport {
    pub fn new(service: ProductService<InMemoryProductStore>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Transport for ProductTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let product_id = parse_path_id(path, "/product/")?;
        Ok(render(self.service.get(product_id).await, path))
    }
}

/// Serves `/recommendation?productId={productId}`.
pub struct RecommendationTransport {
    service: RecommendationService<InMemoryRecommendationStore>,
}

impl RecommendationTransport {
    pub fn new(service: RecommendationService<InMemoryRecommendationStore>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Transport for RecommendationTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let product_id = parse_path_id(path, "/recommendation?productId=")?;
        Ok(render(self.service.get(product_id).await, path))
    }
}

/// Serves `/review?productId={productId}`.
pub struct ReviewTransport {
    service: ReviewService<InMemoryReviewStore>,
}

impl ReviewTransport {
    pub fn new(service: ReviewService<InMemoryReviewStore>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Transport for ReviewTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let product_id = parse_path_id(path, "/review?productId=")?;
        Ok(render(self.service.get(product_id).await, path))
    }
}

/// Gateways only emit the paths above, so an unroutable path is reported
/// as a transport failure rather than mapped to a status code.
fn parse_path_id(path: &str, prefix: &str) -> Result<i32, TransportError> {
    path.strip_prefix(prefix)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| TransportError::Connection(format!("unroutable path: {path}")))
}

fn render<T: Serialize>(result: Result<T, ServiceError>, path: &str) -> RawResponse {
    match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(body) => RawResponse::ok(body),
            Err(error) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                path,
                format!("response encoding failed: {error}"),
            ),
        },
        Err(ServiceError::InvalidInput(message)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, path, message)
        }
        Err(ServiceError::NotFound(message)) => {
            error_response(StatusCode::NOT_FOUND, path, message)
        }
    }
}

fn error_response(status: StatusCode, path: &str, message: String) -> RawResponse {
    let info = HttpErrorInfo::new(status, path, message);
    let body = serde_json::to_string(&info).unwrap_or_default();
    RawResponse::new(status.as_u16(), body)
}
