//! Client identity as seen by the transport.
//!
//! The peer address from `ConnectInfo` is the only source. Proxy headers
//! (`X-Forwarded-For` and friends) are client-controlled and ignored.

use axum::extract::ConnectInfo;
use axum::http::Request;
use std::fmt;
use std::net::SocketAddr;

const UNKNOWN: &str = "unknown";

/// Rate-limit key for a request. Inserted as a request extension for the
/// application handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let id = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
