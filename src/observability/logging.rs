//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Report resolved requests for verbose mounts
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level
//! - A custom verbose sink replaces the default event, it does not add to it

use std::path::PathBuf;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::MountConfig;

/// What a verbose mount reports for every resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionEvent {
    pub method: String,
    pub requested_url: String,
    pub resolved_file: PathBuf,
    /// `toml` for handler scripts, otherwise the served data type.
    pub file_type: String,
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("api_mocker={default_level},tower_http={default_level}").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Emit a resolution event according to the mount's verbose settings.
pub fn report_resolution(config: &MountConfig, event: &ResolutionEvent) {
    if let Some(sink) = &config.verbose_sink {
        (sink.0)(event);
    } else if config.verbose {
        tracing::info!(
            method = %event.method,
            url = %event.requested_url,
            file = %event.resolved_file.display(),
            file_type = %event.file_type,
            "api-mocker"
        );
    }
}
