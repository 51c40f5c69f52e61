//! Error types for macrorec.
//!
//! This module defines all error types used throughout the macrorec crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::device::DeviceError;
use crate::session::SessionKind;

/// The main error type for macrorec operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Macro File Errors ===
    /// The macro file does not exist.
    #[error("macro file not found: {path}")]
    MacroNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The macro file exists but is not a valid action log.
    #[error("failed to parse macro file {path}: {source}")]
    MacroParse {
        /// Path to the macro file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The action log has no actions, so there is nothing to play.
    #[error("nothing to play: the macro is empty")]
    EmptyLog,

    // === Session Errors ===
    /// Another session currently owns the input devices.
    #[error("cannot start {requested}: {active} is already in progress")]
    Busy {
        /// The session that was requested.
        requested: SessionKind,
        /// The session that is currently active.
        active: SessionKind,
    },

    /// The loop count supplied by the caller is not a non-negative integer.
    #[error("invalid loop count '{input}': expected a whole number (0 repeats until aborted)")]
    InvalidLoopCount {
        /// The rejected input.
        input: String,
    },

    // === Playback Errors ===
    /// The input backend failed to inject an action.
    #[error("failed to inject {action}: {message}")]
    Injection {
        /// The kind of action being injected.
        action: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Device Errors ===
    /// The device-event layer failed.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for macrorec operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an injection error for the given action kind.
    #[must_use]
    pub fn injection(action: &'static str, message: impl Into<String>) -> Self {
        Self::Injection {
            action,
            message: message.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means another session holds the devices.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Check if this error is a failure to load a macro file.
    #[must_use]
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::MacroNotFound { .. } | Self::MacroParse { .. })
    }

    /// Check if this error means the macro had nothing to play.
    #[must_use]
    pub fn is_empty_log(&self) -> bool {
        matches!(self, Self::EmptyLog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyLog;
        assert_eq!(err.to_string(), "nothing to play: the macro is empty");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_busy_error() {
        let err = Error::Busy {
            requested: SessionKind::Playback,
            active: SessionKind::Recording,
        };
        assert!(err.is_busy());
        assert_eq!(
            err.to_string(),
            "cannot start playback: recording is already in progress"
        );
        assert!(!Error::EmptyLog.is_busy());
    }

    #[test]
    fn test_is_load_failure() {
        let err = Error::MacroNotFound {
            path: PathBuf::from("/tmp/missing.json"),
        };
        assert!(err.is_load_failure());
        assert!(err.to_string().contains("/tmp/missing.json"));

        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err = Error::MacroParse {
            path: PathBuf::from("broken.json"),
            source: json_err,
        };
        assert!(err.is_load_failure());
        assert!(!Error::EmptyLog.is_load_failure());
    }

    #[test]
    fn test_is_empty_log() {
        assert!(Error::EmptyLog.is_empty_log());
        assert!(!Error::internal("x").is_empty_log());
    }

    #[test]
    fn test_invalid_loop_count_display() {
        let err = Error::InvalidLoopCount {
            input: "three".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("three"));
        assert!(msg.contains("whole number"));
    }

    #[test]
    fn test_injection_error() {
        let err = Error::injection("click", "display unavailable");
        assert_eq!(
            err.to_string(),
            "failed to inject click: display unavailable"
        );
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("invalid hotkey");
        assert!(err.to_string().contains("invalid hotkey"));
    }

    #[test]
    fn test_from_device_error() {
        let err: Error = DeviceError::ListenFailed("no display".to_string()).into();
        assert!(matches!(err, Error::Device(_)));
        assert!(err.to_string().contains("no display"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/root/forbidden"));
    }
}
