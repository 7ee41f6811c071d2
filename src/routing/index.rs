//! In-memory index of a mock directory tree.
//!
//! # Responsibilities
//! - Scan a target root into a tree of literal and capturing nodes
//! - Record which response files each directory holds
//! - Cache the scan per mount with TTL and change-notification invalidation
//!
//! # Design Decisions
//! - Children are sorted by name so capture siblings enumerate in a stable order
//! - Symlinked directories are followed; a link back to an ancestor is skipped
//! - Without a cache only the directories a request can reach are read
//! - A missing or unreadable target root yields an empty index, not an error
//! - Snapshots are immutable; a rebuild swaps in a new `Arc`

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;

/// Delimiter wrapping a capture folder name, e.g. `__id__`.
pub const CAPTURE_DELIMITER: &str = "__";

/// How a directory matches a request segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Matches exactly its own name.
    Literal,
    /// Matches any segment and binds it to the parameter name.
    Capture(String),
}

impl NodeKind {
    /// Classify a directory name.
    pub fn from_dir_name(name: &str) -> Self {
        match capture_param(name) {
            Some(param) => NodeKind::Capture(param.to_string()),
            None => NodeKind::Literal,
        }
    }
}

/// Parameter name of a capture folder, if `name` follows the convention.
pub fn capture_param(name: &str) -> Option<&str> {
    let inner = name
        .strip_prefix(CAPTURE_DELIMITER)?
        .strip_suffix(CAPTURE_DELIMITER)?;
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

/// One directory in the mock tree.
#[derive(Debug, Clone)]
pub struct RouteNode {
    name: String,
    kind: NodeKind,
    dir: PathBuf,
    files: BTreeSet<String>,
    children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Absolute or root-relative directory path on disk.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a regular file with this exact name exists in the directory.
    pub fn has_file(&self, file_name: &str) -> bool {
        self.files.contains(file_name)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Child directory with exactly this name.
    pub fn child(&self, name: &str) -> Option<&RouteNode> {
        self.children
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.children[idx])
    }

    /// Capture folder children in enumeration order.
    pub fn captures(&self) -> impl Iterator<Item = (&str, &RouteNode)> {
        self.children.iter().filter_map(|c| match &c.kind {
            NodeKind::Capture(param) => Some((param.as_str(), c)),
            NodeKind::Literal => None,
        })
    }

    pub fn children(&self) -> &[RouteNode] {
        &self.children
    }
}

/// Snapshot of a mock directory tree.
#[derive(Debug, Clone)]
pub struct RouteIndex {
    root: Option<RouteNode>,
}

impl RouteIndex {
    /// Scan `target` recursively.
    pub fn scan(target: &Path) -> Self {
        Self::scan_scoped(target, None)
    }

    /// Scan only the directories a request for `segments` can reach.
    ///
    /// At each depth, descends into the child named like the segment and
    /// into every capture folder. Resolution over the result is the same as
    /// over a full scan.
    pub fn scan_path(target: &Path, segments: &[String]) -> Self {
        Self::scan_scoped(target, Some(segments))
    }

    fn scan_scoped(target: &Path, segments: Option<&[String]>) -> Self {
        let mut ancestors = Vec::new();
        match scan_dir(target, String::new(), NodeKind::Literal, segments, &mut ancestors) {
            Ok(root) => Self { root: Some(root) },
            Err(e) => {
                tracing::debug!(root = %target.display(), error = %e, "Mock root not readable");
                Self { root: None }
            }
        }
    }

    /// An index with no directories at all.
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// Root node; `None` when the target root does not exist.
    pub fn root(&self) -> Option<&RouteNode> {
        self.root.as_ref()
    }

    /// Total number of directories indexed.
    pub fn len(&self) -> usize {
        fn count(node: &RouteNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.root.as_ref().map_or(0, count)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

/// Read `dir` into a node.
///
/// `remaining` limits descent to the segments still to match; `None` scans
/// everything. `ancestors` holds the canonical paths of the directories
/// being scanned above this one.
fn scan_dir(
    dir: &Path,
    name: String,
    kind: NodeKind,
    remaining: Option<&[String]>,
    ancestors: &mut Vec<PathBuf>,
) -> io::Result<RouteNode> {
    let canonical = fs::canonicalize(dir)?;
    let mut files = BTreeSet::new();
    let mut children = Vec::new();

    ancestors.push(canonical);
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            // Entry removed mid-scan
            Err(_) => continue,
        };
        let Some(entry_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "Skipping non UTF-8 entry");
            continue;
        };

        // Both checks follow symlinks
        let path = entry.path();
        if path.is_dir() {
            let child_kind = NodeKind::from_dir_name(&entry_name);
            let rest = match remaining {
                None => None,
                Some([segment, rest @ ..]) if child_kind != NodeKind::Literal || *segment == entry_name => {
                    Some(rest)
                }
                Some(_) => continue,
            };
            match fs::canonicalize(&path) {
                Ok(real) if ancestors.contains(&real) => {
                    tracing::debug!(path = %path.display(), "Skipping directory link cycle");
                }
                Ok(_) => {
                    if let Ok(child) = scan_dir(&path, entry_name, child_kind, rest, ancestors) {
                        children.push(child);
                    }
                }
                Err(_) => {}
            }
        } else if path.is_file() {
            files.insert(entry_name);
        }
    }
    ancestors.pop();

    children.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(RouteNode {
        name,
        kind,
        dir: dir.to_path_buf(),
        files,
        children,
    })
}

/// When a cached index must be rebuilt.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshPolicy {
    /// Maximum snapshot age; zero means no caching unless a watcher runs.
    pub ttl: Duration,
}

impl RefreshPolicy {
    fn is_fresh(&self, age: Duration, watching: bool) -> bool {
        if watching && self.ttl.is_zero() {
            return true;
        }
        age < self.ttl
    }
}

struct Snapshot {
    built_at: Instant,
    index: Arc<RouteIndex>,
}

/// Per-mount holder of the current index snapshot.
pub struct IndexCache {
    target: PathBuf,
    policy: RefreshPolicy,
    current: ArcSwapOption<Snapshot>,
    stale: AtomicBool,
    watching: AtomicBool,
}

impl IndexCache {
    pub fn new(target: impl Into<PathBuf>, policy: RefreshPolicy) -> Self {
        Self {
            target: target.into(),
            policy,
            current: ArcSwapOption::empty(),
            stale: AtomicBool::new(true),
            watching: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Mark the snapshot out of date; the next lookup rescans.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Record whether a filesystem watcher is invalidating this cache.
    ///
    /// Only a running watcher lets a zero TTL keep its snapshot.
    pub fn set_watching(&self, watching: bool) {
        self.watching.store(watching, Ordering::Release);
        self.invalidate();
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::Acquire)
    }

    /// Index to resolve `segments` against.
    ///
    /// Uncached mounts read just the request's path; otherwise the full
    /// snapshot is returned, rescanned if out of date.
    pub async fn get(&self, segments: &[String]) -> Arc<RouteIndex> {
        let watching = self.is_watching();
        if self.policy.ttl.is_zero() && !watching {
            let target = self.target.clone();
            let segments = segments.to_vec();
            return match tokio::task::spawn_blocking(move || RouteIndex::scan_path(&target, &segments)).await {
                Ok(index) => Arc::new(index),
                Err(e) => {
                    tracing::error!(error = %e, "Index scan task failed");
                    Arc::new(RouteIndex::empty())
                }
            };
        }

        if !self.stale.load(Ordering::Acquire) {
            if let Some(snapshot) = self.current.load_full() {
                if self.policy.is_fresh(snapshot.built_at.elapsed(), watching) {
                    return Arc::clone(&snapshot.index);
                }
            }
        }

        // Cleared before scanning so a change during the scan is not lost
        self.stale.store(false, Ordering::Release);

        let target = self.target.clone();
        let index = match tokio::task::spawn_blocking(move || RouteIndex::scan(&target)).await {
            Ok(index) => Arc::new(index),
            Err(e) => {
                tracing::error!(error = %e, "Index scan task failed");
                self.stale.store(true, Ordering::Release);
                return Arc::new(RouteIndex::empty());
            }
        };

        tracing::trace!(root = %self.target.display(), dirs = index.len(), "Route index rebuilt");
        self.current.store(Some(Arc::new(Snapshot {
            built_at: Instant::now(),
            index: Arc::clone(&index),
        })));
        index
    }
}
