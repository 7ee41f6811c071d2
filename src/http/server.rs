//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every configured mount
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve with graceful shutdown

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::MockServerConfig;
use crate::dispatch::Mount;
use crate::handler::HandlerRegistry;
use crate::http::request::{request_id, MakeRequestUuid};

/// HTTP server answering from one or more mock trees.
pub struct MockServer {
    router: Router,
    config: MockServerConfig,
    mounts: usize,
}

impl MockServer {
    /// Create a server for the configured mounts.
    pub fn new(config: MockServerConfig) -> Self {
        Self::with_registry(config, HandlerRegistry::new())
    }

    /// Create a server whose mounts share `registry` for native handlers.
    pub fn with_registry(config: MockServerConfig, registry: HandlerRegistry) -> Self {
        let mounts = config
            .mounts
            .iter()
            .cloned()
            .map(|mount| Mount::new(mount).with_registry(registry.clone()))
            .collect();
        Self::from_mounts(config, mounts)
    }

    /// Create a server from mounts built by the caller, tried in order.
    ///
    /// `config.mounts` is ignored. Each mount's watcher lives as long as the
    /// router does.
    pub fn from_mounts(config: MockServerConfig, mounts: Vec<Mount>) -> Self {
        let count = mounts.len();
        let router = Self::build_router(&config, mounts);
        Self {
            router,
            config,
            mounts: count,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MockServerConfig, mounts: Vec<Mount>) -> Router {
        let mut router = Router::new().fallback(fallback);

        // The last layer added runs first
        for mount in mounts.into_iter().rev() {
            router = mount.apply(router);
        }

        if config.timeouts.request_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id(request).unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for embedding or driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mounts = self.mounts, "Mock server starting");

        let MockServer { router, .. } = self;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Mock server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MockServerConfig {
        &self.config
    }
}

/// Answer for requests no mount took.
async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
