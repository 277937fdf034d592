//! Configuration error types.

use thiserror::Error;

/// Errors raised while building a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    /// The retry policy cannot produce a sane delay sequence.
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// The base URL is empty or lacks an http(s) scheme.
    #[error("invalid base URL {0:?}")]
    InvalidBaseUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "ANALYSIS_MAX_RETRIES".to_string(),
            value: "lots".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"lots\" for ANALYSIS_MAX_RETRIES"
        );
        assert_eq!(
            ConfigError::InvalidBaseUrl("ftp://x".to_string()).to_string(),
            "invalid base URL \"ftp://x\""
        );
    }
}
