//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject values the server cannot start with
//! - Warn about values that only make every lookup miss
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MockServerConfig → Result<(), Vec<ValidationError>>
//! - A missing target directory or an unknown response type is not an error;
//!   such a mount simply resolves nothing at runtime

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{MockServerConfig, ResponseType};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("mounts[{0}].target must not be empty")]
    EmptyTarget(usize),

    #[error("mounts[{index}].body_parser.limit must be greater than 0")]
    ZeroBodyLimit { index: usize },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &MockServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for (index, mount) in config.mounts.iter().enumerate() {
        if mount.target.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyTarget(index));
        } else if !mount.target.is_dir() {
            tracing::warn!(
                mount = index,
                dir = %mount.target.display(),
                "Mock target is not a directory; every request will miss"
            );
        }

        if let ResponseType::Other(ext) = &mount.response_type {
            tracing::warn!(mount = index, ext = %ext, "Unrecognized response type");
        }

        if let Some(options) = mount.body_parser.options() {
            if options.limit == 0 {
                errors.push(ValidationError::ZeroBodyLimit { index });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
