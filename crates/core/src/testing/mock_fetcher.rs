//! Mock page fetcher for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::source::PageFetcher;

/// Mock implementation of the [`PageFetcher`] trait.
///
/// Provides controllable behavior for testing:
/// - Serve configured bodies per page, or a default body
/// - Simulate exhausted fetches (`None`) and per-page latency
/// - Record the order in which pages were requested
pub struct MockPageFetcher {
    pages: Arc<RwLock<HashMap<u64, Value>>>,
    default_body: Arc<RwLock<Option<Value>>>,
    failing: Arc<RwLock<HashSet<u64>>>,
    delays: Arc<RwLock<HashMap<u64, Duration>>>,
    fetched: Arc<RwLock<Vec<u64>>>,
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPageFetcher {
    /// Create a new mock fetcher with no configured pages.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            default_body: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(HashSet::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            fetched: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Configure the body returned for a specific page.
    pub async fn set_page(&self, page: u64, body: Value) {
        self.pages.write().await.insert(page, body);
    }

    /// Configure the body returned for any page without an explicit one.
    pub async fn set_default_body(&self, body: Value) {
        *self.default_body.write().await = Some(body);
    }

    /// Make a page behave as if every fetch attempt failed.
    pub async fn fail_page(&self, page: u64) {
        self.failing.write().await.insert(page);
    }

    /// Delay responses for a page, to exercise out-of-order completion.
    pub async fn delay_page(&self, page: u64, delay: Duration) {
        self.delays.write().await.insert(page, delay);
    }

    /// Pages requested so far, in request order.
    pub async fn fetched_pages(&self) -> Vec<u64> {
        self.fetched.read().await.clone()
    }
}

#[async_trait::async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_page(&self, page: u64) -> Option<Value> {
        self.fetched.write().await.push(page);

        let delay = self.delays.read().await.get(&page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(&page) {
            return None;
        }

        if let Some(body) = self.pages.read().await.get(&page) {
            return Some(body.clone());
        }
        self.default_body.read().await.clone()
    }
}

/// Builds a listing body in the remote wire shape from (file_id, artist,
/// title) triples.
pub fn listing_body(entries: &[(&str, &str, &str)]) -> Value {
    let songs: Vec<Value> = entries
        .iter()
        .map(|(file_id, artist, title)| {
            serde_json::json!({
                "file": {
                    "file_id": file_id,
                    "download_url": format!("/download/{}", file_id),
                    "diff_drums": 3,
                    "diff_guitar": 2,
                },
                "data": { "artist": artist, "title": title }
            })
        })
        .collect();

    serde_json::json!({ "data": { "songs": songs } })
}
