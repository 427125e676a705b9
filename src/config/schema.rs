//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the request guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Sliding-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Malicious payload inspection.
    pub inspection: InspectionConfig,

    /// Request body capture limits.
    pub body: BodyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Optional upstream application to forward admitted requests to.
    pub upstream: UpstreamConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests admitted per client inside one window.
    pub max_requests: u32,

    /// Length of the sliding window in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_secs: 60,
        }
    }
}

/// What to do with a JSON request whose body does not parse.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParseFailurePolicy {
    /// Forward unscanned; the application rejects malformed input.
    #[default]
    Allow,
    /// Reject with 400.
    Reject,
}

/// Payload inspection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InspectionConfig {
    /// Enable body inspection.
    pub enabled: bool,

    /// Deepest JSON nesting level whose values are still scanned.
    pub max_depth: usize,

    /// Behaviour when a JSON body fails to parse.
    pub on_parse_error: ParseFailurePolicy,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 5,
            on_parse_error: ParseFailurePolicy::Allow,
        }
    }
}

/// Body capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Deadline for draining a request body, in milliseconds.
    pub capture_timeout_ms: u64,

    /// Largest body the guard will buffer.
    pub max_bytes: usize,
}

impl BodyConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: 5_000,
            max_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for the application handler) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Console/file line format.
    pub log_format: LogFormat,

    /// Append log lines to this file in addition to stdout.
    pub log_file: Option<String>,

    /// Enable Prometheus metrics.
    pub metrics_enabled: bool,

    /// Address to expose metrics on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). When unset the built-in
    /// demo application is served.
    pub address: Option<String>,

    /// Upstream response deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: None,
            timeout_secs: 30,
        }
    }
}
