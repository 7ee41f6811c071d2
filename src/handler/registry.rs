//! Handler registry.
//!
//! # Responsibilities
//! - Hold native handlers registered by name
//! - Load handler scripts, caching each by path and modification fingerprint
//!
//! # Design Decisions
//! - A script is re-read whenever its mtime or size changes, so edits take
//!   effect on the next request without a restart
//! - Script chains reference the registry weakly (no Arc cycle)
//! - A script that disappeared before loading is reported as missing, which
//!   the dispatcher treats as not found

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;

use crate::handler::script::{HandlerScript, ScriptError};
use crate::handler::{handler_fn, Chain, Exchange, Handler, HandlerResult, SharedHandler};

/// Identity of a script file's contents as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(metadata: &std::fs::Metadata) -> Self {
        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        }
    }
}

struct CachedScript {
    fingerprint: Fingerprint,
    chain: Chain,
}

#[derive(Default)]
pub(crate) struct RegistryInner {
    named: DashMap<String, SharedHandler>,
    scripts: DashMap<PathBuf, CachedScript>,
}

impl RegistryInner {
    pub(crate) fn named(&self, name: &str) -> Option<SharedHandler> {
        self.named.get(name).map(|entry| Arc::clone(entry.value()))
    }
}

/// Outcome of loading a handler script.
#[derive(Debug)]
pub enum LoadError {
    /// The file vanished between resolution and loading.
    Missing,
    Script(ScriptError),
}

/// Shared store of native handlers and compiled scripts.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<RegistryInner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async closure under `name`, replacing any previous one.
    pub fn register<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Exchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_handler(name, handler_fn(f));
    }

    /// Register any handler (including a [`Chain`]) under `name`.
    pub fn register_handler(&self, name: impl Into<String>, handler: impl Handler) {
        let name = name.into();
        tracing::debug!(handler = %name, "Native handler registered");
        self.inner.named.insert(name, Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<SharedHandler> {
        self.inner.named(name)
    }

    /// Number of scripts currently cached.
    pub fn cached_scripts(&self) -> usize {
        self.inner.scripts.len()
    }

    /// Load the chain for a handler script, reusing the cached one if unchanged.
    pub async fn load(&self, path: &Path) -> Result<Chain, LoadError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
            Err(source) => {
                return Err(LoadError::Script(ScriptError::Io {
                    path: path.to_path_buf(),
                    source,
                }))
            }
        };
        let fingerprint = Fingerprint::of(&metadata);

        let cached = self
            .inner
            .scripts
            .get(path)
            .filter(|entry| entry.fingerprint == fingerprint)
            .map(|entry| entry.chain.clone());
        if let Some(chain) = cached {
            return Ok(chain);
        }

        let source = match tokio::fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
            Err(source) => {
                return Err(LoadError::Script(ScriptError::Io {
                    path: path.to_path_buf(),
                    source,
                }))
            }
        };

        let chain = HandlerScript::parse(&source, path)
            .and_then(|script| script.compile(path, Arc::downgrade(&self.inner)))
            .map_err(LoadError::Script)?;

        tracing::debug!(path = %path.display(), steps = chain.len(), "Handler script loaded");
        self.inner.scripts.insert(
            path.to_path_buf(),
            CachedScript {
                fingerprint,
                chain: chain.clone(),
            },
        );
        Ok(chain)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("named", &self.inner.named.len())
            .field("scripts", &self.inner.scripts.len())
            .finish()
    }
}
