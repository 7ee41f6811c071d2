//! Response construction.
//!
//! # Responsibilities
//! - Serve data files with a content type derived from their format
//! - Build the mount's not-found page
//! - Map dispatch failures to HTTP status codes
//!
//! # Design Decisions
//! - Data bytes are sent verbatim; nothing is re-encoded
//! - Body errors are the client's fault (4xx); everything else is a 500
//! - Error details go to the log, not to the client

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::dispatch::DispatchError;
use crate::http::body::BodyError;

/// Prefix of the not-found page body.
pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found on mock files: ";

/// `200 OK` with the file's bytes as `application/<ext>`.
pub fn data_response(bytes: impl Into<Bytes>, ext: &str) -> Response {
    let mut response = Response::new(Body::from(bytes.into()));
    match HeaderValue::from_str(&format!("application/{ext}")) {
        Ok(value) => {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        Err(_) => tracing::warn!(ext = %ext, "Data extension is not a valid content type"),
    }
    response
}

/// `404` page naming the unresolved path.
pub fn not_found_response(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/html")],
        format!("{NOT_FOUND_MESSAGE}{path}"),
    )
        .into_response()
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::Body(BodyError::MalformedJson(_) | BodyError::InvalidUtf8) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Mock dispatch failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Rejected request body");
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
