//! Handler scripts.
//!
//! A handler script is a TOML file whose `[[chain]]` entries are response
//! steps, run in file order:
//!
//! ```toml
//! [[chain]]
//! step = "delay"
//! ms = 200
//!
//! [[chain]]
//! step = "created"
//!
//! [[chain]]
//! step = "json"
//! body = { success = true }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::handler::registry::RegistryInner;
use crate::handler::{handler_fn, helpers, Chain, Exchange, HandlerError, SharedHandler};

/// Errors turning a script file into a chain.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read handler script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid handler script {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid step {position} in {path}: {reason}")]
    Step {
        path: PathBuf,
        position: usize,
        reason: String,
    },
}

/// Parsed contents of a handler script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerScript {
    #[serde(default)]
    pub chain: Vec<Step>,
}

/// One response step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Delay { ms: u64 },
    Status { code: u16 },
    #[serde(rename = "type")]
    ContentType { mime: String },
    Header { name: String, value: String },
    Created,
    Json {
        body: serde_json::Value,
        #[serde(default)]
        status: Option<u16>,
    },
    Text { body: String },
    /// Path relative to the script's directory.
    File { path: PathBuf },
    NotFound,
    Success,
    End,
    Echo,
    /// A native handler registered by name.
    Call { handler: String },
}

impl HandlerScript {
    pub fn parse(source: &str, path: &Path) -> Result<Self, ScriptError> {
        toml::from_str(source).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the chain; relative file paths resolve against `path`'s directory.
    pub(crate) fn compile(
        &self,
        path: &Path,
        registry: Weak<RegistryInner>,
    ) -> Result<Chain, ScriptError> {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let handlers = self
            .chain
            .iter()
            .enumerate()
            .map(|(position, step)| {
                step.to_handler(base, &registry).map_err(|reason| ScriptError::Step {
                    path: path.to_path_buf(),
                    position,
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chain::new(handlers))
    }
}

fn status_code(code: u16) -> Result<StatusCode, String> {
    StatusCode::from_u16(code).map_err(|_| format!("invalid status code {code}"))
}

impl Step {
    fn to_handler(&self, base: &Path, registry: &Weak<RegistryInner>) -> Result<SharedHandler, String> {
        let handler: SharedHandler = match self {
            Step::Delay { ms } => Arc::new(helpers::delay(Duration::from_millis(*ms))),
            Step::Status { code } => Arc::new(helpers::status(status_code(*code)?)),
            Step::ContentType { mime } => {
                Arc::new(helpers::content_type(mime).map_err(|e| e.to_string())?)
            }
            Step::Header { name, value } => {
                Arc::new(helpers::header(name, value).map_err(|e| e.to_string())?)
            }
            Step::Created => Arc::new(helpers::created()),
            Step::Json { body, status } => match status {
                Some(code) => Arc::new(Chain::new(vec![
                    Arc::new(helpers::status(status_code(*code)?)),
                    Arc::new(helpers::json(body.clone())),
                ])),
                None => Arc::new(helpers::json(body.clone())),
            },
            Step::Text { body } => Arc::new(helpers::text(body.clone())),
            Step::File { path } => Arc::new(helpers::file(base.join(path))),
            Step::NotFound => Arc::new(helpers::not_found()),
            Step::Success => Arc::new(helpers::success()),
            Step::End => Arc::new(helpers::end()),
            Step::Echo => Arc::new(helpers::echo()),
            Step::Call { handler } => Arc::new(call(handler.clone(), registry.clone())),
        };
        Ok(handler)
    }
}

/// Run a native handler looked up at call time, so re-registration takes effect.
fn call(name: String, registry: Weak<RegistryInner>) -> impl crate::handler::Handler {
    handler_fn(move |ex: Exchange| {
        let found = registry.upgrade().and_then(|inner| inner.named(&name));
        let name = name.clone();
        async move {
            match found {
                Some(handler) => handler.call(ex).await,
                None => Err(HandlerError::UnknownHandler(name)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = HandlerScript::parse(
            r#"
            [[chain]]
            step = "delay"
            ms = 5

            [[chain]]
            step = "type"
            mime = "image/png"

            [[chain]]
            step = "json"
            status = 201
            body = { success = true, tags = ["a"] }

            [[chain]]
            step = "not_found"

            [[chain]]
            step = "call"
            handler = "audit"
            "#,
            Path::new("GET.toml"),
        )
        .unwrap();

        assert_eq!(
            script.chain,
            vec![
                Step::Delay { ms: 5 },
                Step::ContentType { mime: "image/png".into() },
                Step::Json {
                    body: serde_json::json!({"success": true, "tags": ["a"]}),
                    status: Some(201),
                },
                Step::NotFound,
                Step::Call { handler: "audit".into() },
            ]
        );
    }

    #[test]
    fn test_empty_script_is_empty_chain() {
        let script = HandlerScript::parse("", Path::new("ANY.toml")).unwrap();
        assert!(script.chain.is_empty());
    }

    #[test]
    fn test_unknown_step_is_parse_error() {
        let err = HandlerScript::parse(
            r#"
            [[chain]]
            step = "teleport"
            "#,
            Path::new("GET.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Parse { .. }));
    }

    #[test]
    fn test_bad_status_is_step_error() {
        let script = HandlerScript::parse(
            r#"
            [[chain]]
            step = "status"
            code = 42
            "#,
            Path::new("GET.toml"),
        )
        .unwrap();
        let err = script.compile(Path::new("GET.toml"), Weak::new()).unwrap_err();
        assert!(matches!(err, ScriptError::Step { position: 0, .. }));
    }

    #[tokio::test]
    async fn test_call_without_registry_fails_at_run() {
        use crate::handler::RequestBody;
        use crate::routing::Params;
        use axum::http::{HeaderMap, Method, Uri};

        let script = HandlerScript::parse(
            r#"
            [[chain]]
            step = "call"
            handler = "missing"
            "#,
            Path::new("GET.toml"),
        )
        .unwrap();
        let chain = script.compile(Path::new("GET.toml"), Weak::new()).unwrap();
        let ex = Exchange::new(
            Method::GET,
            Uri::from_static("/"),
            HeaderMap::new(),
            Params::new(),
            RequestBody::Empty,
        );

        let err = chain.run(ex).await.unwrap_err();
        assert!(matches!(err, HandlerError::UnknownHandler(name) if name == "missing"));
    }
}
