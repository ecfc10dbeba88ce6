//! Error types and handling for Labportal
//!
//! This module defines the crate-wide error type. Display formatters never
//! return these; their failures are collapsed at the filter boundary (see
//! [`crate::format::FormatError`]).

use thiserror::Error;

/// Result type alias for Labportal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Main error type for Labportal
#[derive(Debug, Error)]
pub enum PortalError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Filter lookup errors at the rendering boundary
    #[error("Filter error: {message}")]
    Filter { message: String },

    /// Startup sequence errors
    #[error("Initialization error: {message}")]
    Init { message: String },

    /// Error telemetry errors
    #[error("Telemetry error: {message}")]
    Telemetry { message: String },

    /// Analytics client errors
    #[error("Analytics error: {message}")]
    Analytics { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },
}

impl PortalError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PortalError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        PortalError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new filter error
    pub fn filter<S: Into<String>>(message: S) -> Self {
        PortalError::Filter {
            message: message.into(),
        }
    }

    /// Create a new initialization error
    pub fn init<S: Into<String>>(message: S) -> Self {
        PortalError::Init {
            message: message.into(),
        }
    }

    /// Create a new telemetry error
    pub fn telemetry<S: Into<String>>(message: S) -> Self {
        PortalError::Telemetry {
            message: message.into(),
        }
    }

    /// Create a new analytics error
    pub fn analytics<S: Into<String>>(message: S) -> Self {
        PortalError::Analytics {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        PortalError::Network {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        PortalError::Io {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        PortalError::Timeout {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PortalError {
    fn from(err: serde_yaml::Error) -> Self {
        PortalError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(any(feature = "telemetry", feature = "analytics"))]
impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PortalError::config("test config error");
        assert!(matches!(err, PortalError::Config { .. }));

        let err = PortalError::filter("unknown filter");
        assert!(matches!(err, PortalError::Filter { .. }));

        let err = PortalError::validation("field", "test validation error");
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = PortalError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = PortalError::validation("display.timezone", "unknown zone");
        assert_eq!(
            format!("{}", err),
            "Validation error: display.timezone - unknown zone"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PortalError = io.into();
        assert!(matches!(err, PortalError::Io { .. }));
    }
}
