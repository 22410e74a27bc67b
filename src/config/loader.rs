//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::RegistryConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RegistryConfig, ConfigError> {
    let config: RegistryConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RegistryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [registry]
            aggregate_timeout_ms = 200

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.aggregate_timeout_ms, 200);
        assert_eq!(config.http.ask_timeout_ms, 5000);
        assert_eq!(config.http.bind_address, "127.0.0.1:8080");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[http]\nask_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("http.ask_timeout_ms"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse_config("[registry"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("device-registry-{}.toml", std::process::id()));
        fs::write(&path, "[http]\nbind_address = \"127.0.0.1:0\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.http.bind_address, "127.0.0.1:0");

        fs::remove_file(&path).unwrap_or_default();
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }
}
