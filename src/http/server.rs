//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the application router (upstream forwarder or built-in app)
//! - Wrap it in the guard pipeline and the request ID layers
//! - Bind to a listener and serve until shutdown
//! - Apply configuration reloads to the running pipeline
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → PropagateRequestId → guard_middleware → CatchPanic → Timeout → app
//! ```

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::GuardConfig;
use crate::http::app::demo_router;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::http::upstream::{upstream_router, UpstreamState};
use crate::pipeline::{guard_middleware, GuardContext};

/// HTTP server running the request guard in front of an application.
pub struct HttpServer {
    router: Router,
    context: Arc<GuardContext>,
}

impl HttpServer {
    /// Create a server for `config`. Requests are forwarded to
    /// `upstream.address` when set, otherwise served by the built-in app.
    pub fn new(config: GuardConfig) -> Self {
        let app = match &config.upstream.address {
            Some(address) => {
                tracing::info!(upstream = %address, "Forwarding admitted requests upstream");
                upstream_router(UpstreamState::new(
                    address,
                    Duration::from_secs(config.upstream.timeout_secs),
                ))
            }
            None => demo_router(),
        };
        Self::with_app(config, app)
    }

    /// Create a server guarding an arbitrary application router.
    pub fn with_app(config: GuardConfig, app: Router) -> Self {
        let context = Arc::new(GuardContext::new(config.clone()));
        let router = Self::build_router(&config, app, context.clone());
        Self { router, context }
    }

    #[allow(deprecated)]
    fn build_router(config: &GuardConfig, app: Router, context: Arc<GuardContext>) -> Router {
        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(context, guard_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn context(&self) -> Arc<GuardContext> {
        self.context.clone()
    }

    /// Serve connections on `listener` until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` are applied to the
    /// running pipeline without dropping connections.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GuardConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let context = self.context.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                context.apply(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
