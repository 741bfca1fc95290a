//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::retry::{RetryClass, RetryClassify};

/// Errors that can occur while driving the external converter.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Converter binary not found.
    #[error("converter not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool exited unsuccessfully.
    #[error("converter failed: {reason}")]
    ToolFailure {
        reason: String,
        stderr: Option<String>,
    },

    /// The tool ran but its output carried no completion marker, so the
    /// produced path cannot be determined.
    #[error("no completion marker in converter output during {step}")]
    MissingMarker { step: &'static str },

    /// The invocation exceeded the configured timeout.
    #[error("converter timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error spawning or talking to the tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    pub fn tool_failure(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ToolFailure {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ToolNotFound { .. })
    }
}

impl RetryClassify for ConverterError {
    fn retry_class(&self) -> RetryClass {
        if self.is_retryable() {
            RetryClass::Transient
        } else {
            RetryClass::Fatal
        }
    }
}
