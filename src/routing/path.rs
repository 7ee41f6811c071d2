//! Request path normalization.
//!
//! # Responsibilities
//! - Drop the query string and fragment
//! - Check and strip the mount's base URL prefix
//! - Split the remainder into non-empty segments
//!
//! # Design Decisions
//! - Prefix match is a literal, case-sensitive string match anchored at the
//!   leading slash; it is not segment-aware (`/apix` passes base `api`)
//! - A path outside the mount is `None`, never an error
//! - Segments are not percent-decoded; directory names are matched as sent

/// Trim a single layer of leading and trailing slashes.
pub fn trim_slashes(text: &str) -> &str {
    let text = text.strip_suffix('/').unwrap_or(text);
    text.strip_prefix('/').unwrap_or(text)
}

/// Remove the query string and fragment from a raw request path.
pub fn strip_query(raw: &str) -> &str {
    match raw.find(['?', '#']) {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Normalize a raw request path against an optional base URL.
///
/// Returns `None` when the path does not belong to this mount.
pub fn normalize(raw: &str, base_url: Option<&str>) -> Option<Vec<String>> {
    let path = strip_query(raw);
    let base = base_url.map(trim_slashes).unwrap_or_default();

    let remainder = if base.is_empty() {
        path
    } else {
        let unrooted = path.strip_prefix('/').unwrap_or(path);
        unrooted.strip_prefix(base)?
    };

    Some(
        remainder
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Join segments back into the relative path reported in not-found bodies.
pub fn display_path(segments: &[String]) -> String {
    segments.join("/")
}
