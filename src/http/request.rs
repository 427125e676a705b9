//! Request ID generation and lookup.
//!
//! `SetRequestIdLayer` stamps an `x-request-id` on requests that arrive
//! without one; `PropagateRequestIdLayer` copies it onto the response. The
//! guard reads it back to correlate log events.

use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Read access to the request ID header.
pub trait RequestIdExt {
    /// The request ID, or `-` when none is present or it is not valid text.
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_uuids() {
        let req = Request::builder().body(()).unwrap();
        let mut maker = UuidRequestId;
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
        assert!(Uuid::parse_str(a.header_value().to_str().unwrap()).is_ok());
    }

    #[test]
    fn reads_header_or_placeholder() {
        let req = Request::builder().header("x-request-id", "abc").body(()).unwrap();
        assert_eq!(req.request_id(), "abc");

        let bare = Request::builder().body(()).unwrap();
        assert_eq!(bare.request_id(), "-");
    }
}
