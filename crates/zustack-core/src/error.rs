//! Error types for Zustack Core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Addressing errors
    #[error("Malformed asset path '{path}': missing {missing} segment")]
    MalformedAddress { path: String, missing: &'static str },

    #[error("Invalid asset URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Environment errors
    #[error("HLS is not supported in this browser")]
    UnsupportedEnvironment,

    #[error("Failed to create streaming engine: {0}")]
    EngineCreation(String),

    #[error("Failed to create player widget: {0}")]
    WidgetCreation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if retrying the same operation could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::EngineCreation(_) | Error::WidgetCreation(_))
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MalformedAddress { .. } => "MALFORMED_ADDRESS",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::UnsupportedEnvironment => "UNSUPPORTED_ENV",
            Error::EngineCreation(_) => "ENGINE_CREATE",
            Error::WidgetCreation(_) => "WIDGET_CREATE",
            Error::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::MalformedAddress {
            path: "/stream/eu".to_string(),
            missing: "bucket",
        };
        assert_eq!(err.error_code(), "MALFORMED_ADDRESS");
        assert!(err.to_string().contains("missing bucket segment"));
        assert_eq!(Error::UnsupportedEnvironment.error_code(), "UNSUPPORTED_ENV");
    }

    #[test]
    fn test_every_variant_has_distinct_code() {
        let errors = [
            Error::MalformedAddress { path: "/".into(), missing: "location" },
            Error::InvalidUrl(url::ParseError::EmptyHost),
            Error::config("bad"),
            Error::UnsupportedEnvironment,
            Error::EngineCreation("boom".into()),
            Error::WidgetCreation("boom".into()),
            Error::Internal("boom".into()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(Error::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::EngineCreation("boom".into()).is_recoverable());
        assert!(!Error::UnsupportedEnvironment.is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
    }
}
