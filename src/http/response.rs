//! Rejection responses.
//!
//! # Responsibilities
//! - Map every pipeline rejection to a status code and a fixed JSON body
//! - Provide the generic 500 used when a handler panics
//!
//! # Design Decisions
//! - Bodies are byte-exact constants; other components match on them
//! - Client-facing text never includes internal detail

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;

pub const MALICIOUS_CONTENT_BODY: &str =
    r#"{"detail": "Request blocked due to suspected malicious content."}"#;
pub const RATE_LIMITED_BODY: &str = r#"{"detail": "Rate limit exceeded. Try again in a moment."}"#;
pub const BODY_TOO_LARGE_BODY: &str = r#"{"detail": "Request body too large."}"#;
pub const INVALID_JSON_BODY: &str = r#"{"detail": "Request body is not valid JSON."}"#;
pub const INTERNAL_ERROR_BODY: &str = r#"{"detail": "Internal server error."}"#;
pub const UPSTREAM_FAILED_BODY: &str = r#"{"detail": "Upstream request failed."}"#;
pub const UPSTREAM_TIMEOUT_BODY: &str = r#"{"detail": "Upstream request timed out."}"#;

/// Why a request was answered by the guard instead of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MaliciousContent,
    RateLimited,
    BodyTooLarge,
    InvalidJson,
    Internal,
    UpstreamFailed,
    UpstreamTimeout,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MaliciousContent | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamFailed => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::MaliciousContent => MALICIOUS_CONTENT_BODY,
            Self::RateLimited => RATE_LIMITED_BODY,
            Self::BodyTooLarge => BODY_TOO_LARGE_BODY,
            Self::InvalidJson => INVALID_JSON_BODY,
            Self::Internal => INTERNAL_ERROR_BODY,
            Self::UpstreamFailed => UPSTREAM_FAILED_BODY,
            Self::UpstreamTimeout => UPSTREAM_TIMEOUT_BODY,
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MaliciousContent => "malicious_content",
            Self::RateLimited => "rate_limited",
            Self::BodyTooLarge => "body_too_large",
            Self::InvalidJson => "invalid_json",
            Self::Internal => "internal",
            Self::UpstreamFailed => "upstream_failed",
            Self::UpstreamTimeout => "upstream_timeout",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(self.body()),
        )
            .into_response()
    }
}

/// Best-effort text of a panic payload, for server-side logs only.
pub fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_detail(err.as_ref()), "Request handler panicked");
    Rejection::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn malicious_content_is_400_with_exact_body() {
        let response = Rejection::MaliciousContent.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            body_text(response).await,
            "{\"detail\": \"Request blocked due to suspected malicious content.\"}"
        );
    }

    #[tokio::test]
    async fn rate_limited_is_429_with_exact_body() {
        let response = Rejection::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_text(response).await,
            "{\"detail\": \"Rate limit exceeded. Try again in a moment.\"}"
        );
    }

    #[test]
    fn every_body_is_valid_json() {
        for rejection in [
            Rejection::MaliciousContent,
            Rejection::RateLimited,
            Rejection::BodyTooLarge,
            Rejection::InvalidJson,
            Rejection::Internal,
            Rejection::UpstreamFailed,
            Rejection::UpstreamTimeout,
        ] {
            let value: serde_json::Value = serde_json::from_str(rejection.body()).unwrap();
            assert!(value["detail"].is_string(), "{}", rejection.reason());
        }
    }

    #[test]
    fn panic_detail_reads_common_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_detail(owned.as_ref()), "boom");
        let borrowed: Box<dyn Any + Send> = Box::new("bang");
        assert_eq!(panic_detail(borrowed.as_ref()), "bang");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_detail(other.as_ref()), "unknown panic payload");
    }

    #[tokio::test]
    async fn panic_response_hides_detail() {
        let response = panic_response(Box::new("secret internal state".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_text(response).await.contains("secret"));
    }
}
