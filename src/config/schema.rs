//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration for the batch tooling.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Batch parser settings.
    pub parser: ParserConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject grammar deviations such as a missing blank line.
    pub strict: bool,

    /// Service root that relative request targets resolve against.
    pub base_uri: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict: true,
            base_uri: "http://localhost/odata/".to_string(),
        }
    }
}

impl ParserConfig {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_uri)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
