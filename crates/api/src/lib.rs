//! HTTP API server with observability for the product composite system.
//!
//! Provides the aggregate read/write endpoints, with structured logging
//! (tracing) and Prometheus metrics. Also owns the default wiring: the
//! three owning services run in-process, reads reach them through the
//! resilient clients over in-process transports, and writes flow through
//! per-resource event channels drained by spawned consumers.

pub mod config;
pub mod downstream;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use composite::{CompositeService, ProductGateway, RecommendationGateway, ReviewGateway};
use event_channel::InMemoryEventChannel;
use metrics_exporter_prometheus::PrometheusHandle;
use resilient::ResilientClient;
use services::product::{InMemoryProductStore, ProductEventConsumer, ProductService};
use services::recommendation::{
    InMemoryRecommendationStore, RecommendationEventConsumer, RecommendationService,
};
use services::review::{InMemoryReviewStore, ReviewEventConsumer, ReviewService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use downstream::{ProductTransport, RecommendationTransport, ReviewTransport};
use routes::composite::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/product-composite", post(routes::composite::create))
        .route("/product-composite/{id}", get(routes::composite::get))
        .route("/product-composite/{id}", delete(routes::composite::delete))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: in-memory stores, one event
/// channel and one spawned consumer per resource, and resilient clients
/// wired to the owning services over in-process transports.
///
/// Must be called from within a Tokio runtime (the consumers are spawned
/// onto it).
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let addr = config.addr();
    let policy = config.client_policy();
    let breaker = config.breaker_config();

    // Owning services share one store per resource between the consumer
    // (write side) and the transport (read side).
    let product_store = InMemoryProductStore::new();
    let recommendation_store = InMemoryRecommendationStore::new();
    let review_store = InMemoryReviewStore::new();

    let product_service = ProductService::new(product_store, format!("product/{addr}"));
    let recommendation_service =
        RecommendationService::new(recommendation_store, format!("recommendation/{addr}"));
    let review_service = ReviewService::new(review_store, format!("review/{addr}"));

    let (product_channel, product_events) = InMemoryEventChannel::new("products");
    let (recommendation_channel, recommendation_events) =
        InMemoryEventChannel::new("recommendations");
    let (review_channel, review_events) = InMemoryEventChannel::new("reviews");

    tokio::spawn(ProductEventConsumer::new(product_service.clone()).run(product_events));
    tokio::spawn(
        RecommendationEventConsumer::new(recommendation_service.clone())
            .run(recommendation_events),
    );
    tokio::spawn(ReviewEventConsumer::new(review_service.clone()).run(review_events));

    let product_client = ResilientClient::new(
        "product",
        Arc::new(ProductTransport::new(product_service)),
        policy.clone(),
        breaker.clone(),
    );
    let recommendation_client = ResilientClient::new(
        "recommendation",
        Arc::new(RecommendationTransport::new(recommendation_service)),
        policy.clone(),
        breaker.clone(),
    );
    let review_client = ResilientClient::new(
        "review",
        Arc::new(ReviewTransport::new(review_service)),
        policy,
        breaker,
    );

    let composite = CompositeService::new(
        ProductGateway::new(product_client, Arc::new(product_channel)),
        RecommendationGateway::new(recommendation_client, Arc::new(recommendation_channel)),
        ReviewGateway::new(review_client, Arc::new(review_channel)),
        format!("composite/{addr}"),
    );

    Arc::new(AppState { composite })
}
