//! Request guard: an HTTP middleware pipeline that rate-limits clients,
//! inspects JSON bodies for injection payloads and logs every request.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;

pub use config::schema::GuardConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
