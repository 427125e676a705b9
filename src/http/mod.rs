//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack, graceful shutdown)
//!     → request.rs (assign and propagate x-request-id)
//!     → [guard pipeline] (rate limit, inspection, logging)
//!     → upstream.rs (forward to the configured upstream)
//!       or app.rs (built-in handlers)
//!     → response.rs (rejection bodies, panic fallback)
//!     → Send to client
//! ```

pub mod app;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use response::Rejection;
pub use server::HttpServer;
