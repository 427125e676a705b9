//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, capture timeout > 0)
//! - Validate socket addresses before anything binds to them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::uri::Authority;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GuardConfig;

/// Hard ceiling on inspection depth. Deeper payloads are rejected by the
/// JSON parser long before this matters; the ceiling only catches typos.
pub const MAX_INSPECTION_DEPTH: usize = 64;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("inspection.max_depth must be at most {max} (got {got})")]
    DepthTooLarge { max: usize, got: usize },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.max_requests" });
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.window_secs" });
    }

    if config.inspection.max_depth > MAX_INSPECTION_DEPTH {
        errors.push(ValidationError::DepthTooLarge {
            max: MAX_INSPECTION_DEPTH,
            got: config.inspection.max_depth,
        });
    }

    if config.body.capture_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "body.capture_timeout_ms" });
    }
    if config.body.max_bytes == 0 {
        errors.push(ValidationError::Zero { field: "body.max_bytes" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if let Some(upstream) = &config.upstream.address {
        check_authority(&mut errors, "upstream.address", upstream);
        if config.upstream.timeout_secs == 0 {
            errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// `host:port`, where host may be a name. Resolved at connect time.
fn check_authority(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = !value.contains('@')
        && value
            .parse::<Authority>()
            .is_ok_and(|a| a.port_u16().is_some());
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GuardConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.window_secs = 0;
        config.body.capture_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero { field: "rate_limit.window_secs" }));
        assert!(errors.contains(&ValidationError::Zero { field: "body.capture_timeout_ms" }));
    }

    #[test]
    fn upstream_address_checked_only_when_set() {
        let mut config = GuardConfig::default();
        config.upstream.address = Some("localhost".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidAddress {
                field: "upstream.address",
                value: "localhost".into(),
            }]
        );

        config.upstream.address = Some("app.internal:8000".into());
        assert!(validate_config(&config).is_ok());
        config.upstream.address = Some("user@app:8000".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn depth_ceiling_enforced() {
        let mut config = GuardConfig::default();
        config.inspection.max_depth = MAX_INSPECTION_DEPTH + 1;
        assert!(validate_config(&config).is_err());
    }
}
