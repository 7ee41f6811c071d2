//! Per-level wildcard matching.
//!
//! # Responsibilities
//! - List every child directory admissible for one request segment
//! - Bind capture folder parameters as they are crossed
//!
//! # Design Decisions
//! - Exact child first, then capture folders in index order
//! - Parameters are an ordered list; order equals segment order
//! - Each candidate owns its parameter list (branches never share bindings)

use serde::Serialize;

use crate::routing::index::RouteNode;

/// Captured path parameters in path-segment order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding, returning the extended list.
    pub fn with(&self, key: &str, value: &str) -> Self {
        let mut next = self.0.clone();
        next.push((key.to_string(), value.to_string()));
        Self(next)
    }

    /// Value bound to `key`; the deepest binding wins on duplicates.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object of the bindings; duplicate keys keep the last value.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in self.iter() {
            map.insert(k.to_string(), serde_json::Value::String(v.to_string()));
        }
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A directory reached while walking the request path.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub node: &'a RouteNode,
    pub params: Params,
}

/// Children of `parent` that can stand for `segment`, in priority order.
pub fn match_level<'a>(
    parent: Option<&'a RouteNode>,
    segment: &str,
    params: &Params,
) -> Vec<Candidate<'a>> {
    let Some(parent) = parent else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    if let Some(exact) = parent.child(segment) {
        candidates.push(Candidate {
            node: exact,
            params: params.clone(),
        });
    }

    for (param, node) in parent.captures() {
        candidates.push(Candidate {
            node,
            params: params.with(param, segment),
        });
    }

    candidates
}
