//! Request body decoding for handler scripts.
//!
//! # Responsibilities
//! - Read the request body once, before a handler chain runs
//! - Decode it as JSON, text, or raw bytes when the content type matches
//! - Enforce the size limit on every body read, decoded or not
//!
//! # Design Decisions
//! - A content type that does not match the parser leaves the body unparsed
//! - Parameters such as `charset` are ignored when matching types
//! - With the parser disabled handlers receive the bytes untouched, up to
//!   the default limit

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use http_body_util::LengthLimitError;
use thiserror::Error;

use crate::config::schema::{BodyParserKind, BodyParserOptions, DEFAULT_BODY_LIMIT};
use crate::handler::RequestBody;

/// Errors decoding a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("request body is not valid UTF-8")]
    InvalidUtf8,

    #[error("failed to read request body: {0}")]
    Read(axum::Error),
}

/// Essence (`type/subtype`) of the request's content type.
fn content_type_essence(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Whether `essence` matches `pattern` (`*` allowed in either half).
pub fn mime_matches(pattern: &str, essence: &str) -> bool {
    let Some((p_kind, p_sub)) = pattern.trim().split_once('/') else {
        return false;
    };
    let Some((kind, sub)) = essence.split_once('/') else {
        return false;
    };
    (p_kind == "*" || p_kind.eq_ignore_ascii_case(kind)) && (p_sub == "*" || p_sub.eq_ignore_ascii_case(sub))
}

async fn read_all(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.is::<LengthLimitError>() {
            BodyError::TooLarge { limit }
        } else {
            BodyError::Read(axum::Error::new(inner))
        }
    })
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
}

/// Read and decode the request body per the mount's parser options.
pub async fn decode_body(
    headers: &HeaderMap,
    body: Body,
    options: Option<&BodyParserOptions>,
) -> Result<RequestBody, BodyError> {
    let limit = options.map_or(DEFAULT_BODY_LIMIT, |opts| opts.limit);
    if declared_length(headers).is_some_and(|len| len > limit) {
        return Err(BodyError::TooLarge { limit });
    }

    let matched = options.filter(|opts| {
        content_type_essence(headers).is_some_and(|essence| mime_matches(opts.mime(), &essence))
    });

    let Some(options) = matched else {
        let bytes = read_all(body, limit).await?;
        return Ok(if bytes.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Unparsed(bytes)
        });
    };

    let bytes = read_all(body, options.limit).await?;
    if bytes.is_empty() {
        return Ok(RequestBody::Empty);
    }

    match options.kind {
        BodyParserKind::Json => Ok(RequestBody::Json(serde_json::from_slice(&bytes)?)),
        BodyParserKind::Text => String::from_utf8(bytes.to_vec())
            .map(RequestBody::Text)
            .map_err(|_| BodyError::InvalidUtf8),
        BodyParserKind::Raw => Ok(RequestBody::Raw(bytes)),
    }
}
