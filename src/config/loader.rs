//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MockServerConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file.
///
/// Only parses; callers validate with
/// [`validate_config`](crate::config::validation::validate_config) once any
/// overrides are applied.
pub fn load_config(path: &Path) -> Result<MockServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<MockServerConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_config;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mocker.toml");
        fs::write(
            &path,
            r#"
            [[mounts]]
            base_url = "/api"
            target = "mocks"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.mounts.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[[mounts]\ntarget = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_leaves_validation_to_caller() {
        let mut config = parse_config(
            r#"
            [listener]
            bind_address = "not an address"
            "#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());

        // A command-line override replaces the bad value before validation
        config.listener.bind_address = "127.0.0.1:0".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "not an address"

            [[mounts]]
            target = ""
            "#,
        )
        .unwrap();
        let err = ConfigError::Validation(validate_config(&config).unwrap_err());
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("bind_address"));
        assert!(message.contains("mounts[0]"));
    }
}
