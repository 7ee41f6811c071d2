//! Response dispatch for one mount point.
//!
//! # Data Flow
//! ```text
//! Request
//!     → routing::path (strip base URL and query, split segments)
//!         not under the base URL → Next
//!     → negotiate data extension (configured, or Accept for `auto`)
//!     → routing::resolver over the mount's current index
//!         miss → 404 page, or Next when next_on_not_found
//!     → data file    → bytes as application/<ext>
//!     → handler script → decode body → run chain
//!         finished   → response
//!         unfinished → Next, carrying the status and headers set so far
//! ```
//!
//! # Design Decisions
//! - A file that disappears between resolution and reading is a miss
//! - A mount never retries another candidate after a file fails to load
//! - Captured params travel to `Next` as a request extension
//! - A mount owns its watcher; the index only trusts it once it is running

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use notify::RecommendedWatcher;
use thiserror::Error;

use crate::config::schema::{MountConfig, ResponseType};
use crate::config::watcher::MockTreeWatcher;
use crate::handler::registry::LoadError;
use crate::handler::{Exchange, HandlerError, HandlerRegistry, ScriptError};
use crate::http::body::{decode_body, BodyError};
use crate::http::negotiate::{negotiate, NEGOTIABLE_TYPES};
use crate::http::response::{data_response, not_found_response};
use crate::observability::logging::{report_resolution, ResolutionEvent};
use crate::observability::metrics::{self, Outcome};
use crate::routing::path::{display_path, normalize};
use crate::routing::resolver::{resolve, MethodFiles, ResolvedTarget, TargetKind, HANDLER_EXTENSION};
use crate::routing::{IndexCache, Params, RefreshPolicy};

/// Failures that end a request with an error response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("failed to read mock file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a mount decided to do with a request.
#[derive(Debug)]
pub enum MountOutcome {
    /// Answer with this response.
    Respond(Response),
    /// Pass the request on to the next layer.
    Next(Request<Body>),
}

/// Status and headers an unfinished handler chain set before delegating.
///
/// Travels with the delegated request as an extension and is merged onto
/// whatever the next layer answers.
#[derive(Debug, Clone)]
pub struct PendingResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl PendingResponse {
    fn from_exchange(exchange: &Exchange) -> Self {
        Self {
            status: exchange.status(),
            headers: exchange.response_headers().clone(),
        }
    }

    /// Merge onto the next layer's response.
    ///
    /// Headers the next layer set itself are kept. The pending status
    /// replaces only a plain 200.
    pub fn apply_to(self, response: &mut Response) {
        if self.status != StatusCode::OK && response.status() == StatusCode::OK {
            *response.status_mut() = self.status;
        }
        let headers = response.headers_mut();
        for name in self.headers.keys() {
            if headers.contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// A mock directory served under a URL prefix.
pub struct Mount {
    config: Arc<MountConfig>,
    index: Arc<IndexCache>,
    registry: HandlerRegistry,
    // Held only to keep notifications flowing
    watcher: Option<Mutex<RecommendedWatcher>>,
}

/// Mount `target` under `base_url` with default options.
pub fn mount(base_url: &str, target: impl Into<PathBuf>) -> Mount {
    Mount::new(MountConfig::new(target).base_url(base_url))
}

impl Mount {
    pub fn new(config: MountConfig) -> Self {
        let policy = RefreshPolicy {
            ttl: Duration::from_millis(config.index_ttl_ms),
        };
        let index = Arc::new(IndexCache::new(config.target.clone(), policy));
        Self {
            config: Arc::new(config),
            index,
            registry: HandlerRegistry::new(),
            watcher: None,
        }
    }

    /// Mount `config` under `base_url`, overriding any base URL it carries.
    pub fn at(base_url: &str, config: MountConfig) -> Self {
        Self::new(config.base_url(base_url))
    }

    /// Share a registry of native handlers with other mounts.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Start the filesystem watcher if the mount asks for one.
    ///
    /// Returns whether a watcher is running afterwards. On failure the index
    /// keeps following its TTL. [`Mount::apply`] calls this.
    pub fn watch(&mut self) -> Result<bool, notify::Error> {
        if !self.config.watch || self.watcher.is_some() {
            return Ok(self.watcher.is_some());
        }
        let watcher = MockTreeWatcher::new(Arc::clone(&self.index)).run()?;
        self.watcher = Some(Mutex::new(watcher));
        Ok(true)
    }

    /// Whether the index is being kept fresh by a running watcher.
    pub fn is_watching(&self) -> bool {
        self.index.is_watching()
    }

    /// Extension data files are served with, `None` if the client accepts none.
    fn data_extension(&self, request: &Request<Body>) -> Option<String> {
        match &self.config.response_type {
            ResponseType::Json => Some("json".to_string()),
            ResponseType::Xml => Some("xml".to_string()),
            ResponseType::Other(ext) => Some(ext.clone()),
            ResponseType::Auto => {
                let accept = request.headers().get(ACCEPT).and_then(|v| v.to_str().ok());
                negotiate(accept, &NEGOTIABLE_TYPES).map(str::to_string)
            }
        }
    }

    /// Resolve and answer one request.
    pub async fn handle(&self, request: Request<Body>) -> Result<MountOutcome, DispatchError> {
        let outcome = self.dispatch(request).await;
        match &outcome {
            Ok(MountOutcome::Next(_)) => metrics::record_outcome(Outcome::Delegated),
            Ok(MountOutcome::Respond(_)) => {}
            Err(_) => metrics::record_outcome(Outcome::Error),
        }
        outcome
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<MountOutcome, DispatchError> {
        let Some(segments) = normalize(request.uri().path(), self.config.base_url.as_deref()) else {
            return Ok(MountOutcome::Next(request));
        };

        let ext = self.data_extension(&request);
        let files = MethodFiles::new(request.method().as_str(), ext.as_deref());

        let start = Instant::now();
        let index = self.index.get(&segments).await;
        let resolved = resolve(&index, &segments, &files);
        metrics::record_resolution(start);

        let Some(target) = resolved else {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                probed = ?files.names().collect::<Vec<_>>(),
                "No mock file matched"
            );
            return Ok(self.not_found(request, &segments));
        };

        match target.kind {
            TargetKind::Data => {
                let ext = ext.unwrap_or_default();
                self.serve_data(request, &segments, target, &ext).await
            }
            TargetKind::Executable => self.run_handler(request, &segments, target).await,
        }
    }

    fn not_found(&self, request: Request<Body>, segments: &[String]) -> MountOutcome {
        if self.config.next_on_not_found {
            return MountOutcome::Next(request);
        }
        metrics::record_outcome(Outcome::NotFound);
        MountOutcome::Respond(not_found_response(&display_path(segments)))
    }

    fn report(&self, request: &Request<Body>, target: &ResolvedTarget, file_type: &str) {
        let requested_url = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.to_string())
            .unwrap_or_else(|| request.uri().to_string());

        report_resolution(
            &self.config,
            &ResolutionEvent {
                method: request.method().to_string(),
                requested_url,
                resolved_file: target.file_path.clone(),
                file_type: file_type.to_string(),
            },
        );
    }

    async fn serve_data(
        &self,
        request: Request<Body>,
        segments: &[String],
        target: ResolvedTarget,
        ext: &str,
    ) -> Result<MountOutcome, DispatchError> {
        let bytes = match tokio::fs::read(&target.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = %target.file_path.display(), "Mock file vanished before read");
                return Ok(self.not_found(request, segments));
            }
            Err(source) => {
                return Err(DispatchError::Read {
                    path: target.file_path,
                    source,
                })
            }
        };

        self.report(&request, &target, ext);
        metrics::record_outcome(Outcome::Data);
        Ok(MountOutcome::Respond(data_response(bytes, ext)))
    }

    async fn run_handler(
        &self,
        request: Request<Body>,
        segments: &[String],
        target: ResolvedTarget,
    ) -> Result<MountOutcome, DispatchError> {
        let chain = match self.registry.load(&target.file_path).await {
            Ok(chain) => chain,
            Err(LoadError::Missing) => {
                tracing::debug!(file = %target.file_path.display(), "Handler script vanished before load");
                return Ok(self.not_found(request, segments));
            }
            Err(LoadError::Script(e)) => return Err(e.into()),
        };

        self.report(&request, &target, HANDLER_EXTENSION);

        let (mut parts, body) = request.into_parts();
        let body = decode_body(&parts.headers, body, self.config.body_parser.options().as_ref()).await?;
        let exchange = Exchange::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            target.params.clone(),
            body,
        );

        let exchange = chain.run(exchange).await?;
        if exchange.is_finished() {
            metrics::record_outcome(Outcome::Handler);
            return Ok(MountOutcome::Respond(exchange.into_response()));
        }

        tracing::debug!(file = %target.file_path.display(), "Handler chain did not finish, delegating");
        parts.extensions.insert::<Params>(target.params);
        parts.extensions.insert(PendingResponse::from_exchange(&exchange));
        Ok(MountOutcome::Next(Request::from_parts(parts, Body::empty())))
    }
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("target", &self.config.target)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
