//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the base URI can anchor relative request targets
//! - Check the log filter directive parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BatchConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::BatchConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parser.base_uri '{0}' is not an absolute URL: {1}")]
    InvalidBaseUri(String, String),

    #[error("parser.base_uri '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("parser.base_uri '{0}' must end with '/'")]
    MissingTrailingSlash(String),

    #[error("observability.log_level '{0}' is not a valid filter: {1}")]
    InvalidLogLevel(String, String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let base_uri = &config.parser.base_uri;

    match config.parser.base_url() {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(base_uri.clone()));
            }
            if !url.path().ends_with('/') {
                errors.push(ValidationError::MissingTrailingSlash(base_uri.clone()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidBaseUri(base_uri.clone(), e.to_string())),
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
            e.to_string(),
        ));
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
    fn test_default_config_is_valid() {
        assert!(validate_config(&BatchConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BatchConfig::default();
        config.parser.base_uri = "ftp://example.org/service".to_string();
        config.observability.log_level = "odata_batch=loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::UnsupportedScheme(_)));
        assert!(matches!(errors[1], ValidationError::MissingTrailingSlash(_)));
        assert!(matches!(errors[2], ValidationError::InvalidLogLevel(_, _)));
    }

    #[test]
    fn test_relative_base_uri() {
        let mut config = BatchConfig::default();
        config.parser.base_uri = "odata/".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidBaseUri(_, _)));
    }
}
