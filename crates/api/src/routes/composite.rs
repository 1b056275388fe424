//! Product-composite endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{OriginalUri, Path, State};
use axum::http::StatusCode;
use common::CompositeProduct;
use composite::CompositeService;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub composite: CompositeService,
}

/// GET /product-composite/{productId} — fetch the aggregated view.
#[tracing::instrument(skip(state, uri))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(product_id): Path<i32>,
) -> Result<Json<CompositeProduct>, ApiError> {
    state
        .composite
        .get_composite(product_id)
        .await
        .map(Json)
        .map_err(|error| ApiError::from_composite(uri.path(), error))
}

/// POST /product-composite — dispatch creation of the aggregate.
///
/// Returns 200 once every CREATE event is enqueued. The owning services
/// apply them afterwards; an immediate follow-up read may not see the new
/// state yet.
#[tracing::instrument(skip(state, uri, body), fields(product_id = body.product_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<CompositeProduct>,
) -> Result<StatusCode, ApiError> {
    state
        .composite
        .create_composite(body)
        .await
        .map(|()| StatusCode::OK)
        .map_err(|error| ApiError::from_composite(uri.path(), error))
}

/// DELETE /product-composite/{productId} — dispatch deletion of the
/// aggregate. Idempotent: deleting an absent aggregate also returns 200.
#[tracing::instrument(skip(state, uri))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(product_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .composite
        .delete_composite(product_id)
        .await
        .map(|()| StatusCode::OK)
        .map_err(|error| ApiError::from_composite(uri.path(), error))
}
