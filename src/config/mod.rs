//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → swapped into the live GuardContext
//!
//! With --watch:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → sent to HttpServer::run over a channel
//!     → atomic swap of the pipeline settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BodyConfig, GuardConfig, InspectionConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ParseFailurePolicy, RateLimitConfig, TimeoutConfig, UpstreamConfig,
};
pub use watcher::ConfigWatcher;
