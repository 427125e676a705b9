//! Request guard server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ entry log ─▶ rate limit ─▶ body capture
//!                                                                  │
//!                                                                  ▼
//!     Client Response                                       JSON inspection
//!     ◀────────────── request id ◀─ completion log ◀─ app / upstream ◀┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use request_guard::config::{load_config, validation::validate_config, ConfigError, ConfigWatcher};
use request_guard::lifecycle::{shutdown_signal, Shutdown};
use request_guard::observability::{logging::init_logging, metrics};
use request_guard::{GuardConfig, HttpServer};

#[derive(Parser)]
#[command(name = "request-guard")]
#[command(about = "HTTP request guard: rate limiting, payload inspection and request logging", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload pipeline settings when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability)?;

    tracing::info!("request-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        inspection = config.inspection.enabled,
        max_depth = config.inspection.max_depth,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    // Kept alive until the server stops; dropping it ends the watch.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, config_updates, server_shutdown));

    if let Err(e) = shutdown_signal().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signals");
    }
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
