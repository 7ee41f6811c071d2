//! Mock tree watcher for index invalidation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::routing::index::IndexCache;

/// A watcher that marks a mount's route index stale when its tree changes.
pub struct MockTreeWatcher {
    path: PathBuf,
    index: Arc<IndexCache>,
}

impl MockTreeWatcher {
    /// Create a new MockTreeWatcher for the cache's target directory.
    pub fn new(index: Arc<IndexCache>) -> Self {
        Self {
            path: index.target().to_path_buf(),
            index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching the tree in a background thread.
    ///
    /// The returned watcher must be kept alive for notifications to flow.
    /// The cache is marked as watched only once watching has started.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let index = Arc::clone(&self.index);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() {
                        tracing::debug!(paths = ?event.paths, "Mock tree changed");
                        index.invalidate();
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                    // Without reliable events, fall back to rescanning
                    index.invalidate();
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;
        self.index.set_watching(true);

        tracing::info!(path = ?self.path, "Mock tree watcher started");
        Ok(watcher)
    }
}
