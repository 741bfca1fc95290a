//! Core library for the versehound catalog mirror.
//!
//! The crate is organized around the two stages of the product:
//! - the crawler ([`crawler`]) keeps the local store in sync with the remote
//!   listing ([`source`]), and
//! - the acquisition pipeline ([`acquisition`]) downloads and converts the
//!   records a user marked wanted, via the external [`converter`].
//!
//! Both stages share the [`retry`] policy and the [`store`] interface.

pub mod acquisition;
pub mod config;
pub mod converter;
pub mod crawler;
pub mod metrics;
pub mod retry;
pub mod source;
pub mod store;
pub mod testing;

pub use acquisition::{
    AcquireError, AcquireStatus, AcquisitionConfig, AcquisitionPipeline, AcquisitionSummary,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{content_id, ConverterConfig, ConverterError, OnyxConverter, SongConverter};
pub use crawler::{
    CrawlError, CrawlOutcome, CrawlProgress, CrawlSummary, Crawler, CrawlerConfig, PageOutcome,
};
pub use retry::{RetryClass, RetryClassify, RetryConfig, RetryPolicy};
pub use source::{parse_page, FetchError, HttpPageFetcher, PageFetcher, ParsedPage, SourceConfig};
pub use store::{SongRecord, SongStore, SqliteStore, StoreError, WantedSong};
