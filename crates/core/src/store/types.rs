//! Types for the local song catalog store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the mirrored catalog: a downloadable song and its
/// acquisition state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRecord {
    /// Remote file id (primary key, stable across runs).
    pub file_id: String,
    /// Artist name.
    pub artist: String,
    /// Song title.
    pub title: String,
    /// Drums difficulty rating, if charted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_drums: Option<i64>,
    /// Guitar difficulty rating, if charted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_guitar: Option<i64>,
    /// Bass difficulty rating, if charted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_bass: Option<i64>,
    /// Vocals difficulty rating, if charted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_vocals: Option<i64>,
    /// Host-relative download URL as published in the listing.
    pub download_url: String,
    /// Marked for acquisition by the user. Never set by the crawler.
    #[serde(default)]
    pub wanted: bool,
    /// Whether the final package has been produced.
    #[serde(default)]
    pub downloaded: bool,
    /// Path of the produced package. Set only together with `downloaded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
}

impl SongRecord {
    /// Builds a freshly observed record with default acquisition state.
    pub fn observed(
        file_id: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            artist: artist.into(),
            title: title.into(),
            diff_drums: None,
            diff_guitar: None,
            diff_bass: None,
            diff_vocals: None,
            download_url: download_url.into(),
            wanted: false,
            downloaded: false,
            download_path: None,
        }
    }
}

/// The slice of a record the acquisition pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WantedSong {
    pub file_id: String,
    pub artist: String,
    pub title: String,
    pub download_url: String,
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}
