//! Durable crawl progress: cursor plus retry set.
//!
//! The artifact is a small JSON document rewritten after every settled page,
//! so a killed process resumes from the last confirmed state. It is removed
//! only on a clean caught-up termination, which intentionally makes the next
//! run rescan from page 1.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors reading or writing the progress artifact.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid progress file: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Durable state of an interrupted crawl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrawlProgress {
    /// Smallest page number not yet confirmed processed. Monotonically
    /// non-decreasing across a run.
    pub last_page: u64,

    /// Pages that failed unrecoverably in a prior run; retried before any
    /// new page is attempted.
    #[serde(default)]
    pub retry_pages: BTreeSet<u64>,
}

impl Default for CrawlProgress {
    fn default() -> Self {
        Self {
            last_page: 1,
            retry_pages: BTreeSet::new(),
        }
    }
}

impl CrawlProgress {
    /// Loads progress from a prior interrupted run, or starts fresh from
    /// page 1 when no artifact exists.
    pub fn load(path: &Path) -> Result<Self, ProgressError> {
        if !path.exists() {
            debug!("no progress artifact, starting from page 1");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let progress = serde_json::from_str(&data)?;
        debug!(?progress, "loaded progress from previous run");
        Ok(progress)
    }

    /// Rewrites the artifact. Called after every settled page.
    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Removes the artifact after a clean caught-up termination. A missing
    /// file is not an error.
    pub fn clear(path: &Path) -> Result<(), ProgressError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let progress = CrawlProgress::load(&dir.path().join("progress.json")).unwrap();
        assert_eq!(progress.last_page, 1);
        assert!(progress.retry_pages.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        let mut progress = CrawlProgress::default();
        progress.last_page = 42;
        progress.retry_pages.insert(7);
        progress.retry_pages.insert(3);
        progress.save(&path).unwrap();

        let loaded = CrawlProgress::load(&path).unwrap();
        assert_eq!(loaded, progress);
    }

    #[test]
    fn test_artifact_wire_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        std::fs::write(&path, r#"{"last_page": 10, "retry_pages": [3, 7]}"#).unwrap();
        let progress = CrawlProgress::load(&path).unwrap();
        assert_eq!(progress.last_page, 10);
        assert_eq!(
            progress.retry_pages.iter().copied().collect::<Vec<_>>(),
            vec![3, 7]
        );
    }

    #[test]
    fn test_missing_retry_pages_defaults_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        std::fs::write(&path, r#"{"last_page": 5}"#).unwrap();
        let progress = CrawlProgress::load(&path).unwrap();
        assert_eq!(progress.last_page, 5);
        assert!(progress.retry_pages.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        CrawlProgress::default().save(&path).unwrap();
        CrawlProgress::clear(&path).unwrap();
        assert!(!path.exists());
        // Second clear on a missing file is fine.
        CrawlProgress::clear(&path).unwrap();
    }

    #[test]
    fn test_corrupt_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            CrawlProgress::load(&path),
            Err(ProgressError::Invalid(_))
        ));
    }
}
