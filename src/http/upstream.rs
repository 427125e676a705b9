//! Forwarding admitted requests to a separate upstream application.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream authority
//! - Preserve method, path, query, headers and request ID
//! - Stream the upstream response back unchanged
//!
//! # Design Decisions
//! - The body handed to the upstream is whatever the guard left in the
//!   request: the replayed buffer for inspected requests, the untouched
//!   transport stream otherwise
//! - Connect errors become 502, deadline overruns 504

use axum::{
    body::Body,
    extract::State,
    http::{uri::Scheme, Request, Uri, Version},
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;

use crate::http::request::RequestIdExt;
use crate::http::response::Rejection;

#[derive(Clone)]
pub struct UpstreamState {
    client: Client<HttpConnector, Body>,
    address: Arc<str>,
    timeout: Duration,
}

impl UpstreamState {
    pub fn new(address: &str, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            address: Arc::from(address),
            timeout,
        }
    }
}

/// Router sending every request to the upstream.
pub fn upstream_router(state: UpstreamState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

async fn forward(State(state): State<UpstreamState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = match Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(&*state.address)
        .path_and_query(path_and_query)
        .build()
    {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Cannot build upstream URI");
            return Rejection::UpstreamFailed.into_response();
        }
    };
    parts.uri = uri;
    parts.version = Version::HTTP_11;

    let upstream_request = Request::from_parts(parts, body);
    match tokio::time::timeout(state.timeout, state.client.request(upstream_request)).await {
        Ok(Ok(response)) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, upstream = %state.address, error = %e, "Upstream error");
            Rejection::UpstreamFailed.into_response()
        }
        Err(_) => {
            tracing::warn!(request_id = %request_id, upstream = %state.address, timeout = ?state.timeout, "Upstream timed out");
            Rejection::UpstreamTimeout.into_response()
        }
    }
}
