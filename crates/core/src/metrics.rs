//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Crawler (pages by outcome, records upserted, fetch retries)
//! - Acquisition (downloads by result, conversions by step)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Crawler Metrics
// =============================================================================

/// Pages settled, by outcome.
pub static PAGES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("versehound_pages_processed_total", "Total pages settled"),
        &["outcome"], // "advance", "caught_up", "transient", "malformed"
    )
    .unwrap()
});

/// Records written to the store by the crawler.
pub static RECORDS_UPSERTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "versehound_records_upserted_total",
        "Total catalog records upserted",
    )
    .unwrap()
});

/// Listing fetch retries.
pub static FETCH_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "versehound_fetch_retries_total",
        "Total listing page fetch retries",
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition attempts, by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "versehound_downloads_total",
            "Total song acquisition attempts",
        ),
        &["result"], // "success", "skipped", "failed"
    )
    .unwrap()
});

/// Converter invocations, by step and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("versehound_conversions_total", "Total converter steps run"),
        &["step", "result"], // step: "import", "package"
    )
    .unwrap()
});

/// Duration of full per-record acquisitions.
pub static ACQUISITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "versehound_acquisition_duration_seconds",
            "Duration of one record's acquisition",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Crawler
        Box::new(PAGES_PROCESSED.clone()),
        Box::new(RECORDS_UPSERTED.clone()),
        Box::new(FETCH_RETRIES.clone()),
        // Acquisition
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(ACQUISITION_DURATION.clone()),
    ]
}
