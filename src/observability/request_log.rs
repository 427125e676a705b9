//! Entry/completion logging for every request.
//!
//! [`on_start`] hands out a [`RequestToken`]; [`on_finish`] consumes it. A
//! token dropped without `on_finish` (handler panic, cancelled future) still
//! emits its completion event from `Drop`, so each entry line has exactly
//! one completion line.

use axum::http::{Method, StatusCode, Uri};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::pipeline::outcome::PipelineState;

/// Correlates the entry and completion events of one request.
#[derive(Debug)]
pub struct RequestToken {
    method: Method,
    target: String,
    request_id: String,
    started: Instant,
    state: PipelineState,
    /// Last non-terminal state, kept so a rejection shows where it happened.
    reached: PipelineState,
    finished: bool,
}

impl RequestToken {
    /// Move to `state`. Terminal states are not left once reached.
    pub fn advance(&mut self, state: PipelineState) {
        if self.state.is_terminal() {
            return;
        }
        tracing::trace!(request_id = %self.request_id, from = %self.state, to = %state, "Pipeline transition");
        if !state.is_terminal() {
            self.reached = state;
        }
        self.state = state;
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn reached(&self) -> PipelineState {
        self.reached
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn complete(&mut self, status: Option<StatusCode>) {
        self.finished = true;
        let elapsed = self.elapsed();
        let secs = elapsed.as_secs_f64();

        match status {
            Some(status) => {
                self.advance(PipelineState::Completed);
                tracing::info!(
                    request_id = %self.request_id,
                    method = %self.method,
                    status = status.as_u16(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    state = %self.state,
                    reached = %self.reached,
                    "Response sent: {} ({:.4}s)",
                    status.as_u16(),
                    secs
                );
                metrics::record_request(self.method.as_str(), status.as_u16(), elapsed);
            }
            None => {
                tracing::warn!(
                    request_id = %self.request_id,
                    method = %self.method,
                    status = "aborted",
                    elapsed_ms = elapsed.as_millis() as u64,
                    state = %self.state,
                    reached = %self.reached,
                    "Response sent: aborted ({:.4}s)",
                    secs
                );
                metrics::record_aborted(self.method.as_str());
            }
        }
    }
}

impl Drop for RequestToken {
    fn drop(&mut self) {
        if !self.finished {
            self.complete(None);
        }
    }
}

/// Record the entry event and start the clock.
pub fn on_start(method: &Method, target: &Uri, request_id: &str) -> RequestToken {
    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %target,
        "Request received: {} {}",
        method,
        target
    );
    RequestToken {
        method: method.clone(),
        target: target.to_string(),
        request_id: request_id.to_string(),
        started: Instant::now(),
        state: PipelineState::Start,
        reached: PipelineState::Start,
        finished: false,
    }
}

/// Record the completion event for `token`.
pub fn on_finish(mut token: RequestToken, status: StatusCode) {
    token.complete(Some(status));
}
