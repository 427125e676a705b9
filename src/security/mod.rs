//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (peer address → client key)
//!     → rate_limit.rs (sliding window per client key)
//!     → Pass to body capture / inspection
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject when the window is full
//! - No trust in client-supplied forwarding headers
//! - Per-client state lives in a sharded map owned by the guard context

pub mod identity;
pub mod rate_limit;

pub use identity::ClientIdentity;
pub use rate_limit::{SlidingWindowLimiter, WindowPolicy};
