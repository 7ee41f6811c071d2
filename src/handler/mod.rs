//! Executable mock handlers.
//!
//! # Data Flow
//! ```text
//! <METHOD>.toml / ANY.toml (handler script)
//!     → registry.rs (cached by path + modification fingerprint)
//!     → script.rs (parse [[chain]] steps)
//!     → helpers.rs (one handler per step; `call` looks up native handlers)
//!     → Chain (ordered handlers)
//!
//! Per request:
//!     Exchange (method, uri, params, decoded body)
//!     → handler 1 → handler 2 → ... (each awaited before the next starts)
//!     → stop early once a handler finishes the response
//! ```
//!
//! # Design Decisions
//! - A handler's future resolving is its completion signal
//! - Handlers own the exchange while running and hand it back
//! - Errors are not recovered here; they surface to the HTTP layer

pub mod exchange;
pub mod helpers;
pub mod registry;
pub mod script;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

pub use exchange::{Exchange, RequestBody};
pub use registry::HandlerRegistry;
pub use script::{HandlerScript, ScriptError, Step};

/// Errors raised while running a handler chain.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error("no handler registered as '{0}'")]
    UnknownHandler(String),

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn failed(message: impl std::fmt::Display) -> Self {
        HandlerError::Failed(message.to_string())
    }
}

pub type HandlerResult = Result<Exchange, HandlerError>;

/// One step of a mock response.
pub trait Handler: Send + Sync + 'static {
    /// Run against the exchange and hand it back when done.
    fn call(&self, exchange: Exchange) -> BoxFuture<'static, HandlerResult>;
}

pub type SharedHandler = Arc<dyn Handler>;

/// Adapter turning an async closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

/// Build a handler from `async fn(Exchange) -> HandlerResult`-shaped closures.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler { f }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, exchange: Exchange) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(exchange))
    }
}

/// Handlers run strictly one after another.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Arc<Vec<SharedHandler>>,
}

impl Chain {
    pub fn new(handlers: Vec<SharedHandler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// A single handler as a one-element chain.
    pub fn single(handler: impl Handler) -> Self {
        Self::new(vec![Arc::new(handler)])
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler in order, stopping once the response is finished.
    pub async fn run(&self, mut exchange: Exchange) -> HandlerResult {
        for (position, handler) in self.handlers.iter().enumerate() {
            if exchange.is_finished() {
                tracing::trace!(
                    skipped = self.handlers.len() - position,
                    "Response finished, skipping rest of chain"
                );
                break;
            }
            exchange = handler.call(exchange).await?;
        }
        Ok(exchange)
    }
}

impl Handler for Chain {
    fn call(&self, exchange: Exchange) -> BoxFuture<'static, HandlerResult> {
        let chain = self.clone();
        Box::pin(async move { chain.run(exchange).await })
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("len", &self.handlers.len()).finish()
    }
}
