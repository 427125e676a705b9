//! Built-in application served when no upstream is configured.

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

pub fn demo_router() -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/echo", post(echo).put(echo).patch(echo))
        .fallback(not_found)
}

async fn healthcheck() -> impl IntoResponse {
    tracing::info!("Healthcheck endpoint hit");
    Json(json!({ "message": "I AM ALIVE" }))
}

/// Returns the request body verbatim, with the request's content type.
async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    ([(header::CONTENT_TYPE, content_type)], body)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
