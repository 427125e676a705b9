//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every guarded request produces:
//!     → request_log.rs (entry + completion events, paired)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! logging.rs installs the sink those events land in:
//!     → stdout (pretty or JSON)
//!     → optional append-only file
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through entry and completion events
//! - Payloads are never logged, only targets and pattern kinds

pub mod logging;
pub mod metrics;
pub mod request_log;

pub use request_log::{on_finish, on_start, RequestToken};
