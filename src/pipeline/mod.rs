//! Request guard pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → coordinator.rs (entry log, ordering, short-circuit)
//!     → security::rate_limit (admit / 429)
//!     → body.rs (drain once, replayable buffer)   ┐ POST/PUT/PATCH
//!     → inspector.rs + patterns.rs (scan / 400)   ┘ with JSON body
//!     → application handler (replayed body)
//!     → coordinator.rs (completion log)
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before capture so rejected requests are never buffered
//! - Malformed JSON is the application's problem; malicious JSON is ours
//! - Every stage returns an `Outcome`; the first `Reject` ends the request

pub mod body;
pub mod coordinator;
pub mod inspector;
pub mod outcome;
pub mod patterns;

pub use body::{capture, BufferedBody, CaptureError, CaptureOptions, Completion};
pub use coordinator::{guard_middleware, GuardContext};
pub use inspector::{wants_inspection, PayloadInspector, Verdict};
pub use outcome::{Outcome, PipelineState};
pub use patterns::{MaliciousPatternSet, PatternKind, MALICIOUS_PATTERNS};
