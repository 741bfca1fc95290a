//! Crawl scheduler: drives a bounded pool of page tasks to completion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::config::CrawlerConfig;
use super::progress::CrawlProgress;
use super::queue::PageQueue;
use super::types::{CrawlError, CrawlOutcome, CrawlSummary, PageOutcome};
use crate::metrics;
use crate::source::{parse_page, PageFetcher, ParsedPage};
use crate::store::SongStore;

/// Mutable crawl state, owned by the scheduler and touched only under one
/// lock so progress persistence is linearizable with page completion.
struct CrawlState {
    progress: CrawlProgress,
    consecutive_caught_up: u32,
    /// Gate for scheduling new pages. In-flight pages always finish.
    stop_scheduling: bool,
    /// Set once the caught-up threshold fires; decides the termination kind.
    caught_up: bool,
    pages_processed: u64,
    new_records: u64,
}

/// Crawls the remote listing page by page until the mirror is current.
///
/// Pages are processed by a fixed-size pool; outcomes may settle in any
/// order, so the cursor only ever moves forward via a max. Progress survives
/// process termination between any two page completions.
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn SongStore>,
}

impl Crawler {
    pub fn new(
        config: CrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn SongStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
        }
    }

    /// Runs one crawl to its natural stop condition.
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let progress = CrawlProgress::load(&self.config.progress_path)?;
        info!(
            last_page = progress.last_page,
            pending_retries = progress.retry_pages.len(),
            max_page = self.config.max_page,
            "starting crawl"
        );

        let mut queue = PageQueue::new(&progress, self.config.max_page);
        let state = Mutex::new(CrawlState {
            progress,
            consecutive_caught_up: 0,
            stop_scheduling: false,
            caught_up: false,
            pages_processed: 0,
            new_records: 0,
        });

        let mut tasks: JoinSet<Result<PageOutcome, crate::store::StoreError>> = JoinSet::new();
        let mut page_of_task: HashMap<tokio::task::Id, u64> = HashMap::new();
        let mut fatal: Option<CrawlError> = None;

        for _ in 0..self.config.concurrency.max(1) {
            let Some(page) = queue.next() else { break };
            let handle = tasks.spawn(Self::process_page(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.store),
                page,
            ));
            page_of_task.insert(handle.id(), page);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (page, outcome) = match joined {
                Ok((id, Ok(outcome))) => {
                    let page = page_of_task.remove(&id).unwrap_or_default();
                    (page, outcome)
                }
                Ok((id, Err(store_err))) => {
                    // Store unreachable: fatal to the run. The page itself
                    // still settles into the retry set first.
                    let page = page_of_task.remove(&id).unwrap_or_default();
                    error!(page, error = %store_err, "store failure while processing page");
                    if fatal.is_none() {
                        fatal = Some(CrawlError::Store(store_err));
                    }
                    (page, PageOutcome::TransientFailure)
                }
                Err(join_err) => {
                    let page = page_of_task.remove(&join_err.id()).unwrap_or_default();
                    error!(page, error = %join_err, "page task failed unexpectedly");
                    (page, PageOutcome::TransientFailure)
                }
            };

            let schedule_next = {
                let mut st = state.lock().expect("crawl state mutex poisoned");
                self.settle(&mut st, page, &outcome);
                if let Err(e) = st.progress.save(&self.config.progress_path) {
                    error!(error = %e, "failed to persist crawl progress");
                    if fatal.is_none() {
                        fatal = Some(CrawlError::Progress(e));
                    }
                    st.stop_scheduling = true;
                }
                if fatal.is_some() {
                    st.stop_scheduling = true;
                }
                !st.stop_scheduling
            };

            if schedule_next {
                if let Some(next_page) = queue.next() {
                    let handle = tasks.spawn(Self::process_page(
                        Arc::clone(&self.fetcher),
                        Arc::clone(&self.store),
                        next_page,
                    ));
                    page_of_task.insert(handle.id(), next_page);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        let st = state.into_inner().expect("crawl state mutex poisoned");
        let outcome = if st.caught_up {
            CrawlProgress::clear(&self.config.progress_path)?;
            CrawlOutcome::CaughtUp
        } else {
            CrawlOutcome::RangeExhausted
        };

        let retry_pages: Vec<u64> = st.progress.retry_pages.iter().copied().collect();
        match outcome {
            CrawlOutcome::CaughtUp => info!(
                pages = st.pages_processed,
                new_records = st.new_records,
                "crawl caught up with the remote catalog"
            ),
            CrawlOutcome::RangeExhausted => {
                info!(
                    pages = st.pages_processed,
                    new_records = st.new_records,
                    "crawl exhausted the page range"
                );
                if !retry_pages.is_empty() {
                    warn!(
                        ?retry_pages,
                        "pages left unresolved, the next run retries them first"
                    );
                }
            }
        }

        Ok(CrawlSummary {
            outcome,
            pages_processed: st.pages_processed,
            new_records: st.new_records,
            retry_pages,
        })
    }

    /// Folds one settled page into the crawl state.
    fn settle(&self, st: &mut CrawlState, page: u64, outcome: &PageOutcome) {
        st.pages_processed += 1;
        metrics::PAGES_PROCESSED
            .with_label_values(&[outcome.label()])
            .inc();

        match outcome {
            PageOutcome::Advance { new_records } => {
                st.progress.retry_pages.remove(&page);
                // Max, never plain assignment: pages settle out of order and
                // the cursor must not regress past confirmed work.
                st.progress.last_page = st.progress.last_page.max(page + 1);
                st.consecutive_caught_up = 0;
                st.new_records += new_records;
                info!(page, new_records, "page added new records");
            }
            PageOutcome::CaughtUp | PageOutcome::Malformed => {
                st.progress.retry_pages.remove(&page);
                st.consecutive_caught_up += 1;
                match outcome {
                    PageOutcome::Malformed => {
                        warn!(page, streak = st.consecutive_caught_up, "page was malformed")
                    }
                    _ => info!(
                        page,
                        streak = st.consecutive_caught_up,
                        "page already fully known"
                    ),
                }
                if st.consecutive_caught_up >= self.config.caught_up_threshold && !st.caught_up {
                    info!(
                        threshold = self.config.caught_up_threshold,
                        "caught-up threshold reached, draining in-flight pages"
                    );
                    st.caught_up = true;
                    st.stop_scheduling = true;
                }
            }
            PageOutcome::TransientFailure => {
                st.progress.retry_pages.insert(page);
                warn!(page, "page failed, queued for retry on the next run");
            }
        }
    }

    /// Processes a single page: fetch, parse, dedup-gate, upsert.
    ///
    /// Only store failures surface as errors; everything else settles as a
    /// page outcome.
    async fn process_page(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn SongStore>,
        page: u64,
    ) -> Result<PageOutcome, crate::store::StoreError> {
        let Some(body) = fetcher.fetch_page(page).await else {
            return Ok(PageOutcome::TransientFailure);
        };

        let records = match parse_page(page, &body) {
            ParsedPage::Malformed => return Ok(PageOutcome::Malformed),
            ParsedPage::Empty => {
                debug!(page, "empty listing page");
                return Ok(PageOutcome::CaughtUp);
            }
            ParsedPage::Records(records) => records,
        };

        let ids: Vec<String> = records.iter().map(|r| r.file_id.clone()).collect();
        let existing = store.existing_ids(&ids)?;
        if existing.len() == ids.len() {
            // The listing is sorted by descending update time: a page with
            // zero unseen records means previously ingested territory.
            return Ok(PageOutcome::CaughtUp);
        }

        let new_records = (ids.len() - existing.len()) as u64;
        store.upsert(&records)?;
        metrics::RECORDS_UPSERTED.inc_by(records.len() as u64);

        Ok(PageOutcome::Advance { new_records })
    }
}
