//! Structured error handling for voice-prep
//!
//! A small typed error hierarchy covering configuration, audio processing
//! and input validation failures. Engine failures (prompt construction,
//! generation) are the caller's domain and never appear here.

use std::fmt;
use thiserror::Error;

/// Result type alias with PrepError
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for reference-audio preparation
#[derive(Error, Debug, Clone)]
pub enum PrepError {
    /// Configuration errors, fatal at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Audio processing errors
    #[error("Audio processing error ({operation}): {message}")]
    Audio {
        message: String,
        operation: AudioOperation,
    },

    /// Validation errors for caller-supplied input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Audio operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOperation {
    Mixdown,
    SilenceAnalysis,
    Trimming,
    Clipping,
}

impl fmt::Display for AudioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOperation::Mixdown => write!(f, "mixdown"),
            AudioOperation::SilenceAnalysis => write!(f, "silence analysis"),
            AudioOperation::Trimming => write!(f, "trimming"),
            AudioOperation::Clipping => write!(f, "clipping"),
        }
    }
}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add a simple message context
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PrepError::Internal {
            message: format!("{}: {}", f(), e),
        })
    }

    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for PrepError {
    fn from(err: anyhow::Error) -> Self {
        PrepError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrepError::Config {
            message: "cache max_size must be greater than zero".to_string(),
        };
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("max_size"));
    }

    #[test]
    fn test_audio_operation_display() {
        assert_eq!(AudioOperation::SilenceAnalysis.to_string(), "silence analysis");
        assert_eq!(AudioOperation::Mixdown.to_string(), "mixdown");
    }

    #[test]
    fn test_context_ext() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "boom",
        ));
        let err = res.context("reading config").unwrap_err();
        assert!(err.to_string().contains("reading config"));
        assert!(err.to_string().contains("boom"));
    }
}
