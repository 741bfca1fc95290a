//! Error types for talking to the remote listing.

use thiserror::Error;

use crate::retry::{RetryClass, RetryClassify};

/// Errors raised by one HTTP attempt against the remote catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl FetchError {
    /// Maps a `reqwest` error to the retry taxonomy.
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else {
            FetchError::InvalidBody(e.to_string())
        }
    }

    /// Classifies an HTTP status code. 2xx never reaches this point.
    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            FetchError::RateLimited
        } else {
            FetchError::Status { status }
        }
    }
}

impl RetryClassify for FetchError {
    fn retry_class(&self) -> RetryClass {
        match self {
            FetchError::Timeout | FetchError::Connection(_) => RetryClass::Transient,
            FetchError::RateLimited => RetryClass::RateLimited,
            FetchError::Status { status } if *status >= 500 => RetryClass::Transient,
            FetchError::Status { .. } => RetryClass::Fatal,
            FetchError::InvalidBody(_) => RetryClass::Transient,
        }
    }
}
