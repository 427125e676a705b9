//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Console output always; optional append-only log file
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - JSON format for production, pretty format for development
//! - File output never carries ANSI colour codes

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError, EnvFilter,
};

use crate::config::{LogFormat, ObservabilityConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("logging already initialised: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let file = config
        .log_file
        .as_deref()
        .map(open_log_file)
        .transpose()?
        .map(Mutex::new);

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry
            .with(fmt::layer())
            .with(file.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json())
            .with(file.map(|w| fmt::layer().json().with_writer(w)))
            .try_init()?,
    }
    Ok(())
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    let to_err = |source| LoggingError::File {
        path: path.to_string(),
        source,
    };
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(to_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_and_parent_are_created() {
        let dir = std::env::temp_dir().join(format!("request-guard-log-{}", std::process::id()));
        let path = dir.join("nested").join("app.log");
        let path_str = path.to_str().unwrap();

        open_log_file(path_str).unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
