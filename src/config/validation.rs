//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that timeouts are consistent with each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RegistryConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("http.ask_timeout_ms ({ask_ms}) must exceed registry.aggregate_timeout_ms ({aggregate_ms})")]
    AskTimeoutTooShort { ask_ms: u64, aggregate_ms: u64 },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("unknown log level: {0}")]
    InvalidLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.registry.aggregate_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "registry.aggregate_timeout_ms" });
    }
    if config.http.ask_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "http.ask_timeout_ms" });
    } else if config.http.ask_timeout_ms <= config.registry.aggregate_timeout_ms {
        errors.push(ValidationError::AskTimeoutTooShort {
            ask_ms: config.http.ask_timeout_ms,
            aggregate_ms: config.registry.aggregate_timeout_ms,
        });
    }

    if config.http.enabled && config.http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "http.bind_address",
            value: config.http.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&RegistryConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = RegistryConfig::default();
        config.registry.aggregate_timeout_ms = 0;
        config.http.bind_address = "not-an-address".to_string();
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "registry.aggregate_timeout_ms" }));
        assert!(errors.contains(&ValidationError::InvalidLogLevel("loud".to_string())));
    }

    #[test]
    fn test_ask_timeout_must_cover_aggregate() {
        let mut config = RegistryConfig::default();
        config.http.ask_timeout_ms = 3000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::AskTimeoutTooShort { ask_ms: 3000, aggregate_ms: 3000 }]
        );
    }

    #[test]
    fn test_disabled_listeners_are_not_checked() {
        let mut config = RegistryConfig::default();
        config.http.enabled = false;
        config.http.bind_address = String::new();
        config.observability.metrics_address = String::new();

        assert!(validate_config(&config).is_ok());
    }
}
