//! Integration tests for the composite API server.

use std::sync::OnceLock;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let state = api::create_default_state(&api::config::Config::default());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_composite(app: &Router, product_id: i32) -> (StatusCode, serde_json::Value) {
    send(
        app,
        Request::builder()
            .uri(format!("/product-composite/{product_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn post_composite(app: &Router, body: serde_json::Value) -> StatusCode {
    let (status, _) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/product-composite")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await;
    status
}

async fn delete_composite(app: &Router, product_id: i32) -> StatusCode {
    let (status, _) = send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/product-composite/{product_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    status
}

/// Polls the read side until the consumers have applied the dispatched
/// events and the composite reaches the expected status.
async fn await_composite_status(
    app: &Router,
    product_id: i32,
    expected: StatusCode,
) -> serde_json::Value {
    for _ in 0..100 {
        let (status, json) = get_composite(app, product_id).await;
        if status == expected {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("composite {product_id} never reached status {expected}");
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_then_read_composite() {
    let app = setup();

    let status = post_composite(
        &app,
        serde_json::json!({
            "productId": 1,
            "name": "Widget",
            "weight": 10,
            "recommendations": [
                {"recommendationId": 1, "author": "ada", "rate": 4, "content": "solid"}
            ],
            "reviews": [
                {"reviewId": 1, "author": "brian", "rate": 5, "content": "great"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let composite = await_composite_status(&app, 1, StatusCode::OK).await;
    assert_eq!(composite["productId"], 1);
    assert_eq!(composite["name"], "Widget");
    assert_eq!(composite["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(composite["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(composite["recommendations"][0]["author"], "ada");

    // Sub-entity summaries never expose originAddress; the diagnostics
    // section names every participating instance.
    assert!(composite["recommendations"][0]["originAddress"].is_null());
    let addresses = &composite["serviceAddresses"];
    assert!(addresses["composite"].as_str().unwrap().starts_with("composite/"));
    assert!(addresses["product"].as_str().unwrap().starts_with("product/"));
}

#[tokio::test]
async fn test_unknown_product_returns_404_envelope() {
    let app = setup();

    let (status, json) = get_composite(&app, 13).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No product found for productId: 13");
    assert_eq!(json["path"], "/product-composite/13");
    assert_eq!(json["httpStatus"], "NOT_FOUND");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_invalid_product_id_returns_422_envelope() {
    let app = setup();

    let (status, json) = get_composite(&app, -1).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["message"], "Invalid productId: -1");
    assert_eq!(json["httpStatus"], "UNPROCESSABLE_ENTITY");
}

#[tokio::test]
async fn test_non_numeric_product_id_is_a_bad_request() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/product-composite/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_invalid_id_is_rejected() {
    let app = setup();

    let status = post_composite(
        &app,
        serde_json::json!({
            "productId": 0,
            "name": "nope",
            "weight": 1
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_create_still_accepts_the_dispatch() {
    let app = setup();

    let body = serde_json::json!({"productId": 2, "name": "Widget", "weight": 1});
    assert_eq!(post_composite(&app, body.clone()).await, StatusCode::OK);
    await_composite_status(&app, 2, StatusCode::OK).await;

    // The write path only enqueues; the duplicate is rejected later by
    // the owning service, not by this endpoint.
    assert_eq!(post_composite(&app, body).await, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_removes_the_aggregate_and_is_idempotent() {
    let app = setup();

    let status = post_composite(
        &app,
        serde_json::json!({
            "productId": 5,
            "name": "Widget",
            "weight": 1,
            "recommendations": [
                {"recommendationId": 1, "author": "ada", "rate": 4, "content": "solid"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    await_composite_status(&app, 5, StatusCode::OK).await;

    assert_eq!(delete_composite(&app, 5).await, StatusCode::OK);
    await_composite_status(&app, 5, StatusCode::NOT_FOUND).await;

    // Deleting an already-absent aggregate succeeds again.
    assert_eq!(delete_composite(&app, 5).await, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_sub_entities_read_as_empty_lists() {
    let app = setup();

    let status = post_composite(
        &app,
        serde_json::json!({"productId": 7, "name": "Bare", "weight": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let composite = await_composite_status(&app, 7, StatusCode::OK).await;
    assert_eq!(composite["recommendations"], serde_json::json!([]));
    assert_eq!(composite["reviews"], serde_json::json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
