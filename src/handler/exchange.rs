//! Request/response state passed along a handler chain.

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use serde::Serialize;

use crate::handler::HandlerError;
use crate::routing::Params;

/// Request body as seen by handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body was sent.
    #[default]
    Empty,
    /// Body read but not decoded (parser disabled or content type not matched).
    Unparsed(Bytes),
    Json(serde_json::Value),
    Text(String),
    Raw(Bytes),
}

impl RequestBody {
    /// Bytes of an undecoded or raw body.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Unparsed(b) | RequestBody::Raw(b) => Some(b),
            _ => None,
        }
    }

    /// JSON rendering used by the `echo` step.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RequestBody::Empty => serde_json::Value::Null,
            RequestBody::Json(value) => value.clone(),
            RequestBody::Text(text) => serde_json::Value::String(text.clone()),
            RequestBody::Unparsed(b) | RequestBody::Raw(b) => {
                serde_json::Value::String(String::from_utf8_lossy(b).into_owned())
            }
        }
    }
}

/// The request a chain works on and the response it builds.
#[derive(Debug)]
pub struct Exchange {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Params,
    body: RequestBody,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: Bytes,
    finished: bool,
}

impl Exchange {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, params: Params, body: RequestBody) -> Self {
        Self {
            method,
            uri,
            headers,
            params,
            body,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
            finished: false,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Captured path parameters in path order.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.response_headers.insert(name, value);
        self
    }

    /// Set a response header from strings.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, HandlerError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HandlerError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HandlerError::InvalidHeader(name.as_str().to_string()))?;
        Ok(self.insert_header(name, value))
    }

    pub fn response_body(&self) -> &Bytes {
        &self.response_body
    }

    /// Whether a handler has completed the response.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Complete the response with the current body.
    pub fn end(&mut self) -> &mut Self {
        self.finished = true;
        self
    }

    /// Complete the response with `body`.
    pub fn send(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.response_body = body.into();
        self.end()
    }

    /// Complete the response with a JSON document.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, HandlerError> {
        let body = serde_json::to_vec(value)?;
        self.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self.send(body))
    }

    /// Build the HTTP response.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.response_body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        response
    }
}
