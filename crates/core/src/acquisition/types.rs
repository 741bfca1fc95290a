//! Types for the acquisition pipeline.

use std::path::PathBuf;

/// How one record's acquisition attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireStatus {
    /// Downloaded, converted and recorded in the store.
    Completed { package_path: PathBuf },
    /// The asset is not live yet (or carries no URL); re-checked next run.
    Skipped,
}

/// Summary of one acquisition run.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionSummary {
    /// Records that were wanted and not yet downloaded.
    pub attempted: usize,
    /// Records fully acquired this run.
    pub completed: usize,
    /// Records skipped because the asset is not yet published.
    pub skipped: usize,
    /// Records that failed and remain undownloaded for manual follow-up.
    pub failed: usize,
}
