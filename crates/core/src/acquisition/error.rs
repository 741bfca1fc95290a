//! Error types for the acquisition pipeline.

use thiserror::Error;

use crate::converter::ConverterError;
use crate::retry::{RetryClass, RetryClassify};
use crate::source::FetchError;
use crate::store::StoreError;

/// One failed download attempt: either the HTTP transfer or writing the
/// streamed bytes to staging.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Http(#[from] FetchError),

    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetryClassify for DownloadError {
    fn retry_class(&self) -> RetryClass {
        match self {
            DownloadError::Http(e) => e.retry_class(),
            DownloadError::Io(_) => RetryClass::Transient,
        }
    }
}

/// Errors raised by the acquisition pipeline.
///
/// Only [`AcquireError::Store`] aborts a run; everything else is scoped to
/// one record and reported through the run summary.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to set up acquisition: {0}")]
    Setup(String),

    #[error("download failed for {file_id}: {source}")]
    Download {
        file_id: String,
        #[source]
        source: DownloadError,
    },

    #[error("conversion failed for {file_id}: {source}")]
    Convert {
        file_id: String,
        #[source]
        source: ConverterError,
    },
}
