//! Types for the crawl scheduler.

use thiserror::Error;

use crate::store::StoreError;

/// How one page-processing attempt settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// New records were found and stored.
    Advance { new_records: u64 },
    /// Every record on the page already existed locally.
    CaughtUp,
    /// Retries exhausted; unknown whether new data existed.
    TransientFailure,
    /// Response shape invalid. Counts toward the stop heuristic like a
    /// caught-up page but is logged distinctly and never retried.
    Malformed,
}

impl PageOutcome {
    /// Label used for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PageOutcome::Advance { .. } => "advance",
            PageOutcome::CaughtUp => "caught_up",
            PageOutcome::TransientFailure => "transient",
            PageOutcome::Malformed => "malformed",
        }
    }
}

/// Why a crawl run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The caught-up threshold was reached; the mirror is current and the
    /// progress artifact was removed so the next run rescans from page 1.
    CaughtUp,
    /// The page range was exhausted without catching up; progress (and any
    /// retry pages) is kept for the next run.
    RangeExhausted,
}

/// Summary of one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub outcome: CrawlOutcome,
    /// Pages that settled (any outcome) during this run.
    pub pages_processed: u64,
    /// Records that were not previously in the store.
    pub new_records: u64,
    /// Pages left for the next run to retry.
    pub retry_pages: Vec<u64>,
}

/// Errors that abort a whole crawl run.
///
/// Per-page failures never surface here; they settle as
/// [`PageOutcome::TransientFailure`] and land in the retry set.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The store became unreachable. Progress persisted so far is kept.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The progress artifact could not be read or written.
    #[error("progress persistence error: {0}")]
    Progress(#[from] super::progress::ProgressError),
}
