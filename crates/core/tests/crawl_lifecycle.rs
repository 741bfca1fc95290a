//! Crawl lifecycle integration tests.
//!
//! These tests drive the scheduler with a mock page fetcher and an
//! in-memory store:
//! - stop heuristic after consecutive caught-up pages
//! - retry-set-first ordering and progress persistence
//! - cursor monotonicity under out-of-order completion
//! - progress artifact removal on caught-up termination

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use versehound_core::crawler::{CrawlOutcome, CrawlProgress, Crawler, CrawlerConfig};
use versehound_core::store::{SongRecord, SongStore, SqliteStore};
use versehound_core::testing::{listing_body, MockPageFetcher};

/// Test helper bundling the crawler's collaborators.
struct TestHarness {
    fetcher: Arc<MockPageFetcher>,
    store: Arc<SqliteStore>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            fetcher: Arc::new(MockPageFetcher::new()),
            store: Arc::new(SqliteStore::in_memory().expect("in-memory store")),
            temp_dir: TempDir::new().expect("temp dir"),
        }
    }

    fn progress_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("progress.json")
    }

    fn crawler(&self, config: CrawlerConfig) -> Crawler {
        let config = CrawlerConfig {
            progress_path: self.progress_path(),
            ..config
        };
        Crawler::new(
            config,
            Arc::clone(&self.fetcher) as Arc<dyn versehound_core::source::PageFetcher>,
            Arc::clone(&self.store) as Arc<dyn SongStore>,
        )
    }

    /// Seeds the store with records carrying the given ids.
    fn seed_store(&self, ids: &[&str]) {
        let records: Vec<SongRecord> = ids
            .iter()
            .map(|id| SongRecord::observed(*id, "Artist", "Title", format!("/download/{}", id)))
            .collect();
        self.store.upsert(&records).expect("seed upsert");
    }
}

/// Body whose ids are all distinct per page: page N yields "pN-0".."pN-2".
async fn serve_fresh_pages(fetcher: &MockPageFetcher, pages: std::ops::Range<u64>) {
    for page in pages {
        let ids: Vec<String> = (0..3).map(|i| format!("p{}-{}", page, i)).collect();
        let entries: Vec<(&str, &str, &str)> = ids
            .iter()
            .map(|id| (id.as_str(), "Artist", "Title"))
            .collect();
        fetcher.set_page(page, listing_body(&entries)).await;
    }
}

#[tokio::test]
async fn test_caught_up_threshold_stops_run() {
    let harness = TestHarness::new();
    harness.seed_store(&["known-1", "known-2"]);

    // Every page serves only known records.
    harness
        .fetcher
        .set_default_body(listing_body(&[
            ("known-1", "Artist", "Title"),
            ("known-2", "Artist", "Title"),
        ]))
        .await;

    let crawler = harness.crawler(CrawlerConfig {
        max_page: 100_000,
        concurrency: 2,
        caught_up_threshold: 5,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::CaughtUp);
    assert_eq!(summary.new_records, 0);
    // The stop gate fires at the threshold; only in-flight pages settle on
    // top of it, so the run stays far away from max_page.
    assert!(summary.pages_processed >= 5);
    assert!(summary.pages_processed <= 5 + 2);
    // Clean caught-up termination removes the artifact.
    assert!(!harness.progress_path().exists());
}

#[tokio::test]
async fn test_advance_resets_caught_up_streak() {
    let harness = TestHarness::new();
    harness.seed_store(&["known-1"]);

    let known = listing_body(&[("known-1", "Artist", "Title")]);
    // Pages 1-2 known, page 3 fresh, pages 4+ known again: the two early
    // caught-up pages must not count toward the final streak.
    harness.fetcher.set_page(1, known.clone()).await;
    harness.fetcher.set_page(2, known.clone()).await;
    serve_fresh_pages(&harness.fetcher, 3..4).await;
    harness.fetcher.set_default_body(known).await;

    let crawler = harness.crawler(CrawlerConfig {
        concurrency: 1,
        caught_up_threshold: 3,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::CaughtUp);
    assert_eq!(summary.new_records, 3);
    // Pages 1,2 (streak 2), 3 (reset), then 4,5,6 to reach the threshold.
    assert_eq!(summary.pages_processed, 6);
}

#[tokio::test]
async fn test_retry_pages_attempted_before_range() {
    let harness = TestHarness::new();
    harness.seed_store(&["known-1"]);
    harness
        .fetcher
        .set_default_body(listing_body(&[("known-1", "Artist", "Title")]))
        .await;

    let progress = CrawlProgress {
        last_page: 10,
        retry_pages: [3, 7].into_iter().collect(),
    };
    progress.save(&harness.progress_path()).expect("save");

    let crawler = harness.crawler(CrawlerConfig {
        max_page: 12,
        concurrency: 1,
        caught_up_threshold: 100,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::RangeExhausted);

    let fetched = harness.fetcher.fetched_pages().await;
    // Retry pages (any order between them) strictly precede the range.
    assert_eq!(fetched.len(), 4);
    let mut retry_part = fetched[..2].to_vec();
    retry_part.sort_unstable();
    assert_eq!(retry_part, vec![3, 7]);
    assert_eq!(&fetched[2..], &[10, 11]);

    // Every page settled cleanly, so the retry set drained; the cursor only
    // moves on pages that added records, and none did.
    let progress = CrawlProgress::load(&harness.progress_path()).expect("load");
    assert!(progress.retry_pages.is_empty());
    assert_eq!(progress.last_page, 10);
}

#[tokio::test]
async fn test_failed_page_lands_in_retry_set() {
    let harness = TestHarness::new();
    serve_fresh_pages(&harness.fetcher, 1..5).await;
    harness.fetcher.fail_page(2).await;

    let crawler = harness.crawler(CrawlerConfig {
        max_page: 5,
        concurrency: 2,
        caught_up_threshold: 100,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::RangeExhausted);
    assert_eq!(summary.retry_pages, vec![2]);

    // The artifact is kept for the next run and carries the failed page.
    let progress = CrawlProgress::load(&harness.progress_path()).expect("load");
    assert!(progress.retry_pages.contains(&2));
    assert_eq!(progress.last_page, 5);
}

#[tokio::test]
async fn test_cursor_monotonic_under_out_of_order_completion() {
    let harness = TestHarness::new();
    serve_fresh_pages(&harness.fetcher, 1..7).await;
    // Early pages settle last.
    harness.fetcher.delay_page(1, Duration::from_millis(80)).await;
    harness.fetcher.delay_page(2, Duration::from_millis(40)).await;

    let crawler = harness.crawler(CrawlerConfig {
        max_page: 7,
        concurrency: 4,
        caught_up_threshold: 100,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::RangeExhausted);
    assert_eq!(summary.new_records, 6 * 3);

    let progress = CrawlProgress::load(&harness.progress_path()).expect("load");
    // All pages advanced; the max-fold lands on the page past the range
    // regardless of settle order.
    assert_eq!(progress.last_page, 7);
}

#[tokio::test]
async fn test_caught_up_page_upserts_nothing() {
    let harness = TestHarness::new();
    harness.seed_store(&["known-1", "known-2"]);
    harness
        .fetcher
        .set_page(
            1,
            listing_body(&[
                ("known-1", "Artist", "Title"),
                ("known-2", "Artist", "Title"),
            ]),
        )
        .await;

    let crawler = harness.crawler(CrawlerConfig {
        max_page: 2,
        concurrency: 1,
        caught_up_threshold: 100,
        ..CrawlerConfig::default()
    });

    let before = harness.store.get("known-1").expect("get").expect("record");
    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.new_records, 0);

    let after = harness.store.get("known-1").expect("get").expect("record");
    assert_eq!(before.title, after.title);
    assert_eq!(before.download_url, after.download_url);
}

#[tokio::test]
async fn test_malformed_pages_count_toward_stop() {
    let harness = TestHarness::new();
    // Every page returns a shape the parser rejects.
    harness
        .fetcher
        .set_default_body(serde_json::json!({ "data": {} }))
        .await;

    let crawler = harness.crawler(CrawlerConfig {
        concurrency: 1,
        caught_up_threshold: 3,
        ..CrawlerConfig::default()
    });

    let summary = crawler.run().await.expect("crawl");
    assert_eq!(summary.outcome, CrawlOutcome::CaughtUp);
    assert_eq!(summary.pages_processed, 3);
    // Malformed pages are never queued for retry.
    assert!(summary.retry_pages.is_empty());
}

#[tokio::test]
async fn test_rerunning_a_page_is_idempotent() {
    let harness = TestHarness::new();
    serve_fresh_pages(&harness.fetcher, 1..2).await;

    let config = CrawlerConfig {
        max_page: 2,
        concurrency: 1,
        caught_up_threshold: 100,
        ..CrawlerConfig::default()
    };

    let first = harness.crawler(config.clone()).run().await.expect("crawl");
    assert_eq!(first.new_records, 3);

    // Forget the cursor so the second run revisits the same page.
    CrawlProgress::clear(&harness.progress_path()).expect("clear");

    let second = harness.crawler(config).run().await.expect("crawl");
    // Same page again: everything already known, nothing re-added.
    assert_eq!(second.new_records, 0);

    let record = harness.store.get("p1-0").expect("get").expect("record");
    assert!(!record.wanted);
    assert!(!record.downloaded);
}
