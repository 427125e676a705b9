//! Per-request guard middleware.
//!
//! # Ordering
//! 1. Entry log (always first)
//! 2. Rate limit, before any body is buffered
//! 3. Body capture + inspection, only for POST/PUT/PATCH with a JSON body
//! 4. Forward to the application with the replayed body
//! 5. Completion log (always last, whatever state the request ended in)
//!
//! An upgrade handshake is an ordinary request here and runs every stage.
//! Frames on the upgraded connection never pass through this middleware.

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::{GuardConfig, ParseFailurePolicy};
use crate::http::request::RequestIdExt;
use crate::http::response::{panic_detail, Rejection};
use crate::observability::{metrics, request_log, RequestToken};
use crate::pipeline::body::{capture, BufferedBody, CaptureError, CaptureOptions};
use crate::pipeline::inspector::{wants_inspection, PayloadInspector, Verdict};
use crate::pipeline::outcome::{Outcome, PipelineState};
use crate::security::{ClientIdentity, SlidingWindowLimiter, WindowPolicy};

/// Process-wide state shared by every request, created once at startup.
pub struct GuardContext {
    config: ArcSwap<GuardConfig>,
    limiter: SlidingWindowLimiter,
}

impl GuardContext {
    pub fn new(config: GuardConfig) -> Self {
        let limiter = SlidingWindowLimiter::new(WindowPolicy::from(&config.rate_limit));
        Self {
            config: ArcSwap::from_pointee(config),
            limiter,
        }
    }

    /// Swap in new pipeline settings. Per-client history is kept.
    pub fn apply(&self, config: GuardConfig) {
        let current = self.config.load();
        if current.listener != config.listener
            || current.upstream != config.upstream
            || current.timeouts != config.timeouts
        {
            tracing::warn!("Listener, upstream and timeout changes take effect after restart");
        }
        self.limiter.set_policy(WindowPolicy::from(&config.rate_limit));
        self.config.store(Arc::new(config));
        tracing::info!("Pipeline settings reloaded");
    }

    pub fn config(&self) -> Arc<GuardConfig> {
        self.config.load_full()
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }
}

/// Axum middleware running the guard pipeline around `next`.
pub async fn guard_middleware(
    State(ctx): State<Arc<GuardContext>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = ctx.config();
    let mut token = request_log::on_start(request.method(), request.uri(), request.request_id());
    token.advance(PipelineState::Logged);

    let response = run_stages(&ctx, &config, request, next, &mut token).await;

    request_log::on_finish(token, response.status());
    response
}

async fn run_stages(
    ctx: &GuardContext,
    config: &GuardConfig,
    mut request: Request<Body>,
    next: Next,
    token: &mut RequestToken,
) -> Response {
    let client = ClientIdentity::from_request(&request);

    let rate = check_rate(ctx, config, &client);
    token.advance(PipelineState::RateChecked);
    if let Outcome::Reject(rejection) = rate {
        return reject(token, rejection);
    }
    request.extensions_mut().insert(client);

    if config.inspection.enabled && wants_inspection(request.method(), request.headers()) {
        let (parts, body) = request.into_parts();
        let options = CaptureOptions {
            timeout: config.body.capture_timeout(),
            max_bytes: config.body.max_bytes,
        };
        let buffered = match capture(body, options).await {
            Ok(buffered) => buffered,
            Err(CaptureError::TooLarge { limit }) => {
                tracing::warn!(uri = %parts.uri, limit, "Request body too large");
                return reject(token, Rejection::BodyTooLarge);
            }
        };
        token.advance(PipelineState::BodyCaptured);

        let outcome = inspect(config, &buffered, &parts.uri);
        token.advance(PipelineState::Inspected);
        if let Outcome::Reject(rejection) = outcome {
            return reject(token, rejection);
        }

        request = Request::from_parts(parts, buffered.replay());
        request.extensions_mut().insert(buffered);
    } else {
        token.advance(PipelineState::Inspected);
    }

    token.advance(PipelineState::Forwarded);
    next.run(request).await
}

fn check_rate(ctx: &GuardContext, config: &GuardConfig, client: &ClientIdentity) -> Outcome {
    if !config.rate_limit.enabled {
        return Outcome::Continue;
    }
    let admitted = ctx.limiter.admit_now(client.as_str());
    metrics::record_tracked_clients(ctx.limiter.tracked_clients());
    if admitted {
        Outcome::Continue
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        Outcome::Reject(Rejection::RateLimited)
    }
}

fn inspect(config: &GuardConfig, body: &BufferedBody, target: &Uri) -> Outcome {
    // Disconnected bodies reach the handler as a read error; empty ones have
    // nothing to scan.
    if !body.is_complete() || body.is_empty() {
        return Outcome::Continue;
    }

    let inspector = PayloadInspector::new(config.inspection.max_depth);
    let verdict = match panic::catch_unwind(AssertUnwindSafe(|| inspector.inspect(body.bytes()))) {
        Ok(verdict) => verdict,
        Err(payload) => {
            tracing::error!(uri = %target, panic = %panic_detail(payload.as_ref()), "Payload inspection failed");
            return Outcome::Reject(Rejection::Internal);
        }
    };

    match verdict {
        Verdict::Clean => Outcome::Continue,
        Verdict::Malicious(kind) => {
            tracing::warn!(uri = %target, pattern = %kind, "Blocked malicious request");
            Outcome::Reject(Rejection::MaliciousContent)
        }
        Verdict::Unparseable => match config.inspection.on_parse_error {
            ParseFailurePolicy::Allow => Outcome::Continue,
            ParseFailurePolicy::Reject => {
                tracing::info!(uri = %target, "Rejected unparseable JSON body");
                Outcome::Reject(Rejection::InvalidJson)
            }
        },
    }
}

fn reject(token: &mut RequestToken, rejection: Rejection) -> Response {
    token.advance(PipelineState::Rejected);
    metrics::record_rejection(rejection.reason());
    rejection.into_response()
}
