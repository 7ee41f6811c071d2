//! Built-in mock helpers.
//!
//! Each helper builds a [`Handler`] for one common response step. Handler
//! scripts compile their steps into these; native handlers can chain them too.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;

use crate::handler::{handler_fn, Exchange, Handler, HandlerError};

/// Wait before continuing.
pub fn delay(duration: Duration) -> impl Handler {
    handler_fn(move |ex: Exchange| async move {
        tokio::time::sleep(duration).await;
        Ok(ex)
    })
}

/// Set the response status and continue.
pub fn status(code: StatusCode) -> impl Handler {
    handler_fn(move |mut ex: Exchange| async move {
        ex.set_status(code);
        Ok(ex)
    })
}

/// `201 Created`, then continue.
pub fn created() -> impl Handler {
    status(StatusCode::CREATED)
}

/// Set a response header and continue.
pub fn header(name: &str, value: &str) -> Result<impl Handler, HandlerError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HandlerError::InvalidHeader(name.to_string()))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| HandlerError::InvalidHeader(name.as_str().to_string()))?;
    Ok(handler_fn(move |mut ex: Exchange| {
        let (name, value) = (name.clone(), value.clone());
        async move {
            ex.insert_header(name, value);
            Ok(ex)
        }
    }))
}

/// Set the `Content-Type` header and continue.
pub fn content_type(mime: &str) -> Result<impl Handler, HandlerError> {
    header(CONTENT_TYPE.as_str(), mime)
}

/// Finish with a JSON body.
pub fn json(body: serde_json::Value) -> impl Handler {
    handler_fn(move |mut ex: Exchange| {
        let body = body.clone();
        async move {
            ex.json(&body)?;
            Ok(ex)
        }
    })
}

/// Finish with a plain-text body; an earlier `Content-Type` is kept.
pub fn text(body: String) -> impl Handler {
    handler_fn(move |mut ex: Exchange| {
        let body = body.clone();
        async move {
            if !ex.response_headers().contains_key(CONTENT_TYPE) {
                ex.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
            }
            ex.send(body);
            Ok(ex)
        }
    })
}

/// Finish with the contents of a file.
pub fn file(path: PathBuf) -> impl Handler {
    handler_fn(move |mut ex: Exchange| {
        let path = path.clone();
        async move {
            let contents = tokio::fs::read(&path)
                .await
                .map_err(|source| HandlerError::Io { path, source })?;
            ex.insert_header(CONTENT_LENGTH, HeaderValue::from(contents.len()));
            ex.send(contents);
            Ok(ex)
        }
    })
}

/// Finish with `404 Not Found`.
pub fn not_found() -> impl Handler {
    handler_fn(|mut ex: Exchange| async move {
        ex.set_status(StatusCode::NOT_FOUND).end();
        Ok(ex)
    })
}

/// Finish with `200 OK`.
pub fn success() -> impl Handler {
    handler_fn(|mut ex: Exchange| async move {
        ex.set_status(StatusCode::OK).end();
        Ok(ex)
    })
}

/// Finish with whatever has been set so far.
pub fn end() -> impl Handler {
    handler_fn(|mut ex: Exchange| async move {
        ex.end();
        Ok(ex)
    })
}

/// Finish with the captured params and the decoded request body as JSON.
pub fn echo() -> impl Handler {
    handler_fn(|mut ex: Exchange| async move {
        let body = serde_json::json!({
            "params": ex.params().to_json(),
            "body": ex.body().to_json(),
        });
        ex.json(&body)?;
        Ok(ex)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RequestBody;
    use crate::routing::Params;
    use axum::http::{HeaderMap, Method, Uri};

    fn exchange() -> Exchange {
        Exchange::new(
            Method::PUT,
            Uri::from_static("/users/1"),
            HeaderMap::new(),
            Params::new().with("id", "1"),
            RequestBody::Json(serde_json::json!({"name": "ada"})),
        )
    }

    #[tokio::test]
    async fn test_status_continues() {
        let ex = created().call(exchange()).await.unwrap();
        assert_eq!(ex.status(), StatusCode::CREATED);
        assert!(!ex.is_finished());
    }

    #[tokio::test]
    async fn test_content_type_then_text_keeps_type() {
        let ex = content_type("text/csv").unwrap().call(exchange()).await.unwrap();
        let ex = text("a,b".into()).call(ex).await.unwrap();
        assert!(ex.is_finished());
        assert_eq!(ex.response_headers()[CONTENT_TYPE], "text/csv");
        assert_eq!(ex.response_body().as_ref(), b"a,b");
    }

    #[tokio::test]
    async fn test_echo_reports_params_and_body() {
        let ex = echo().call(exchange()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(ex.response_body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"params": {"id": "1"}, "body": {"name": "ada"}})
        );
    }

    #[tokio::test]
    async fn test_file_sets_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let ex = file(path).call(exchange()).await.unwrap();
        assert_eq!(ex.response_headers()[CONTENT_LENGTH], "3");
        assert_eq!(ex.response_body().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file(dir.path().join("nope")).call(exchange()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Io { .. }));
    }

    #[test]
    fn test_invalid_header_rejected_at_build() {
        assert!(header("bad name", "x").is_err());
        assert!(content_type("text/plain\n").is_err());
    }
}
