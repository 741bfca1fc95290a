//! Remote catalog listing: page fetching and parsing.
//!
//! The remote exposes a single paginated endpoint, sorted by descending
//! update time. Fetching is effectful (HTTP with retries), parsing is pure;
//! the crawl scheduler composes the two.

mod config;
mod error;
mod http;
mod parser;
mod types;

pub use config::SourceConfig;
pub use error::FetchError;
pub use http::HttpPageFetcher;
pub use parser::parse_page;
pub use types::ParsedPage;

use serde_json::Value;

/// Retrieves one raw page of the remote listing.
///
/// Implementations retry internally; `None` means every attempt failed and
/// the caller should schedule the page for a later retry rather than treat
/// the run as broken.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: u64) -> Option<Value>;
}
