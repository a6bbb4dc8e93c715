//! Unified error handling for Fortress ID
//!
//! This crate provides a single error type used across all Fortress ID components.
//! Errors only travel across internal seams (provider queries, negotiation sessions,
//! settings IO). The public producers degrade to `None` instead of surfacing them.

use std::io;
use std::path::PathBuf;

/// Result type alias using FortressError
pub type Result<T> = std::result::Result<T, FortressError>;

/// Unified error type for all Fortress ID operations
#[derive(thiserror::Error, Debug)]
pub enum FortressError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Platform Capability Errors
    // ============================================================================
    #[error("Capability {name} failed: {reason}")]
    Capability {
        name: String,
        reason: String,
    },

    #[error("Drawing surface error: {0}")]
    Drawing(String),

    #[error("Digest computation failed: {0}")]
    Digest(String),

    // ============================================================================
    // Network Errors
    // ============================================================================
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Session already closed")]
    SessionClosed,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl FortressError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a capability failure for the named capability
    pub fn capability(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Capability {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a negotiation error from a string
    pub fn negotiation(msg: impl Into<String>) -> Self {
        Self::Negotiation(msg.into())
    }

    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Allow converting from String to FortressError
impl From<String> for FortressError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to FortressError
impl From<&str> for FortressError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_display() {
        let err = FortressError::capability("gpu", "extension blocked");
        assert_eq!(err.to_string(), "Capability gpu failed: extension blocked");
    }

    #[test]
    fn test_from_str() {
        let err: FortressError = "boom".into();
        assert!(matches!(err, FortressError::Generic(ref m) if m == "boom"));
    }

    #[test]
    fn test_file_errors_name_the_path() {
        let err = FortressError::FileRead {
            path: PathBuf::from("/etc/fortress-id/settings.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read file /etc/fortress-id/settings.json: denied"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: FortressError = io_err.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
