//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mock server.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observability::logging::ResolutionEvent;

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MockServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Mount points, tried in order.
    pub mounts: Vec<MountConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request deadline in seconds; 0 disables it.
    pub request_secs: u64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Format data files are served in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseType {
    #[default]
    Json,
    Xml,
    /// Negotiated from the request's `Accept` header.
    Auto,
    /// Any other extension, served as `application/<ext>`.
    Other(String),
}

impl From<String> for ResponseType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "json" => ResponseType::Json,
            "xml" => ResponseType::Xml,
            "auto" => ResponseType::Auto,
            _ => ResponseType::Other(value),
        }
    }
}

impl From<&str> for ResponseType {
    fn from(value: &str) -> Self {
        ResponseType::from(value.to_string())
    }
}

impl From<ResponseType> for String {
    fn from(value: ResponseType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseType::Json => f.write_str("json"),
            ResponseType::Xml => f.write_str("xml"),
            ResponseType::Auto => f.write_str("auto"),
            ResponseType::Other(ext) => f.write_str(ext),
        }
    }
}

/// Request body decoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyParserKind {
    #[default]
    Json,
    Text,
    Raw,
}

impl BodyParserKind {
    /// MIME type matched when none is configured.
    pub fn default_mime(&self) -> &'static str {
        match self {
            BodyParserKind::Json => "application/json",
            BodyParserKind::Text => "text/plain",
            BodyParserKind::Raw => "application/octet-stream",
        }
    }
}

/// Default request body limit in bytes, also applied to unparsed bodies.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Body parser options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyParserOptions {
    /// Decoding mode.
    #[serde(rename = "type")]
    pub kind: BodyParserKind,

    /// Maximum body size in bytes.
    pub limit: usize,

    /// Content type a request must carry to be decoded (`*` wildcards allowed).
    pub mime: Option<String>,
}

impl Default for BodyParserOptions {
    fn default() -> Self {
        Self {
            kind: BodyParserKind::Json,
            limit: DEFAULT_BODY_LIMIT,
            mime: None,
        }
    }
}

impl BodyParserOptions {
    pub fn mime(&self) -> &str {
        self.mime.as_deref().unwrap_or_else(|| self.kind.default_mime())
    }
}

/// `body_parser = false`, `true`, or a table of options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BodyParserSetting {
    Enabled(bool),
    Custom(BodyParserOptions),
}

impl Default for BodyParserSetting {
    fn default() -> Self {
        BodyParserSetting::Enabled(true)
    }
}

impl BodyParserSetting {
    /// Effective options, or `None` when decoding is disabled.
    pub fn options(&self) -> Option<BodyParserOptions> {
        match self {
            BodyParserSetting::Enabled(false) => None,
            BodyParserSetting::Enabled(true) => Some(BodyParserOptions::default()),
            BodyParserSetting::Custom(options) => Some(options.clone()),
        }
    }
}

/// Callback receiving resolution events instead of the default log line.
#[derive(Clone)]
pub struct VerboseSink(pub Arc<dyn Fn(&ResolutionEvent) + Send + Sync>);

impl VerboseSink {
    pub fn new(f: impl Fn(&ResolutionEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for VerboseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerboseSink(..)")
    }
}

/// One mount point: a URL prefix served from a mock directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MountConfig {
    /// Directory holding the mock tree.
    pub target: PathBuf,

    /// URL prefix; `None` when the hosting router already strips it.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Delegate unresolved requests to the next layer instead of answering 404.
    #[serde(default)]
    pub next_on_not_found: bool,

    /// Data file format.
    #[serde(default, rename = "type")]
    pub response_type: ResponseType,

    /// Request body decoding for handler scripts.
    #[serde(default)]
    pub body_parser: BodyParserSetting,

    /// Log every resolved request.
    #[serde(default)]
    pub verbose: bool,

    /// Custom destination for resolution events; takes precedence over `verbose`.
    #[serde(skip)]
    pub verbose_sink: Option<VerboseSink>,

    /// Route index lifetime in milliseconds; 0 rescans on every request.
    #[serde(default)]
    pub index_ttl_ms: u64,

    /// Invalidate the route index on filesystem change notifications.
    #[serde(default)]
    pub watch: bool,
}

impl MountConfig {
    /// A mount serving `target` with every option at its default.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            base_url: None,
            next_on_not_found: false,
            response_type: ResponseType::default(),
            body_parser: BodyParserSetting::default(),
            verbose: false,
            verbose_sink: None,
            index_ttl_ms: 0,
            watch: false,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn next_on_not_found(mut self, enabled: bool) -> Self {
        self.next_on_not_found = enabled;
        self
    }

    pub fn response_type(mut self, response_type: impl Into<ResponseType>) -> Self {
        self.response_type = response_type.into();
        self
    }

    pub fn body_parser(mut self, setting: BodyParserSetting) -> Self {
        self.body_parser = setting;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn verbose_sink(mut self, sink: impl Fn(&ResolutionEvent) + Send + Sync + 'static) -> Self {
        self.verbose_sink = Some(VerboseSink::new(sink));
        self
    }

    pub fn index_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.index_ttl_ms = ttl_ms;
        self
    }

    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_defaults_from_toml() {
        let mount: MountConfig = toml::from_str(r#"target = "./mocks""#).unwrap();
        assert_eq!(mount.target, PathBuf::from("./mocks"));
        assert_eq!(mount.base_url, None);
        assert!(!mount.next_on_not_found);
        assert_eq!(mount.response_type, ResponseType::Json);
        assert_eq!(mount.body_parser.options(), Some(BodyParserOptions::default()));
        assert_eq!(mount.index_ttl_ms, 0);
    }

    #[test]
    fn test_response_type_strings() {
        let mount: MountConfig = toml::from_str(
            r#"
            target = "m"
            type = "yaml"
            "#,
        )
        .unwrap();
        assert_eq!(mount.response_type, ResponseType::Other("yaml".into()));
        assert_eq!(ResponseType::from("auto"), ResponseType::Auto);
        assert_eq!(ResponseType::Xml.to_string(), "xml");
    }

    #[test]
    fn test_body_parser_forms() {
        let disabled: MountConfig = toml::from_str(
            r#"
            target = "m"
            body_parser = false
            "#,
        )
        .unwrap();
        assert_eq!(disabled.body_parser.options(), None);

        let text: MountConfig = toml::from_str(
            r#"
            target = "m"
            body_parser = { type = "text", mime = "text/*", limit = 16 }
            "#,
        )
        .unwrap();
        let options = text.body_parser.options().unwrap();
        assert_eq!(options.kind, BodyParserKind::Text);
        assert_eq!(options.mime(), "text/*");
        assert_eq!(options.limit, 16);
    }

    #[test]
    fn test_server_config_sections() {
        let config: MockServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "0.0.0.0:3000"

            [[mounts]]
            base_url = "/api"
            target = "mocks/api"
            next_on_not_found = true

            [[mounts]]
            target = "mocks/base"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.mounts[0].base_url.as_deref(), Some("/api"));
        assert!(config.mounts[0].next_on_not_found);
        assert_eq!(config.timeouts.request_secs, 0);
        assert_eq!(config.observability.log_level, "info");
    }
}
