//! Route resolution over the mock index.
//!
//! # Responsibilities
//! - Try the all-literal path first
//! - Fall back to a depth-first search across capture folders
//! - Probe method files inside each terminal directory
//!
//! # Design Decisions
//! - First success wins; no scoring across ambiguous completions
//! - An exact child is tried before captures at every level, but a dead
//!   exact branch does not stop capture branches from being explored
//! - Search depth is bounded by the request's segment count

use std::path::PathBuf;

use crate::routing::index::{RouteIndex, RouteNode};
use crate::routing::matcher::{match_level, Params};

/// File extension of executable handler scripts.
pub const HANDLER_EXTENSION: &str = "toml";

/// Method-agnostic file stem.
pub const ANY_METHOD: &str = "ANY";

/// What a resolved file is served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Raw bytes with a negotiated content type.
    Data,
    /// A handler script.
    Executable,
}

/// Final outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub file_path: PathBuf,
    pub kind: TargetKind,
    pub params: Params,
}

/// Ordered file names probed inside a terminal directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFiles {
    names: Vec<(String, TargetKind)>,
}

impl MethodFiles {
    /// Build the probe list for a method and an optional data extension.
    ///
    /// Without a data extension only handler scripts are probed.
    pub fn new(method: &str, data_ext: Option<&str>) -> Self {
        let method = method.to_ascii_uppercase();
        let mut names = Vec::with_capacity(4);
        for stem in [method.as_str(), ANY_METHOD] {
            names.push((format!("{stem}.{HANDLER_EXTENSION}"), TargetKind::Executable));
            if let Some(ext) = data_ext {
                names.push((format!("{stem}.{ext}"), TargetKind::Data));
            }
        }
        Self { names }
    }

    /// First file present in `node`.
    pub fn probe(&self, node: &RouteNode) -> Option<(PathBuf, TargetKind)> {
        self.names
            .iter()
            .find(|(name, _)| node.has_file(name))
            .map(|(name, kind)| (node.dir().join(name), *kind))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(n, _)| n.as_str())
    }
}

/// Resolve `segments` to a response file.
pub fn resolve(index: &RouteIndex, segments: &[String], files: &MethodFiles) -> Option<ResolvedTarget> {
    let root = index.root()?;

    if let Some(target) = resolve_literal(root, segments, files) {
        return Some(target);
    }

    search(root, segments, Params::new(), files)
}

/// Fast path: follow literal children only.
fn resolve_literal(root: &RouteNode, segments: &[String], files: &MethodFiles) -> Option<ResolvedTarget> {
    let mut node = root;
    for segment in segments {
        node = node.child(segment)?;
    }
    let (file_path, kind) = files.probe(node)?;
    Some(ResolvedTarget {
        file_path,
        kind,
        params: Params::new(),
    })
}

/// Backtracking search: candidates are explored depth-first in priority order.
fn search(node: &RouteNode, remaining: &[String], params: Params, files: &MethodFiles) -> Option<ResolvedTarget> {
    let Some((segment, rest)) = remaining.split_first() else {
        let (file_path, kind) = files.probe(node)?;
        return Some(ResolvedTarget {
            file_path,
            kind,
            params,
        });
    };

    match_level(Some(node), segment, &params)
        .into_iter()
        .find_map(|candidate| search(candidate.node, rest, candidate.params, files))
}
