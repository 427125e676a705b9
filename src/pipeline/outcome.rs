//! Per-request pipeline state and stage outcomes.

use std::fmt;

use crate::http::response::Rejection;

/// Where a request is in the guard pipeline.
///
/// ```text
/// Start → Logged → RateChecked → (BodyCaptured →) Inspected → Forwarded → Completed
///                       └──────────────┬───────────────┘
///                                   Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Logged,
    RateChecked,
    BodyCaptured,
    Inspected,
    Forwarded,
    Completed,
    Rejected,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Logged => "logged",
            Self::RateChecked => "rate_checked",
            Self::BodyCaptured => "body_captured",
            Self::Inspected => "inspected",
            Self::Forwarded => "forwarded",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Result of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Reject(Rejection),
}
