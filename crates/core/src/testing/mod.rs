//! Test doubles for core traits.
//!
//! Used by the integration test suites and available to downstream crates
//! that want to exercise the crawler or the acquisition pipeline without a
//! network or an installed converter.

mod mock_converter;
mod mock_fetcher;

pub use mock_converter::{MockSongConverter, RecordedCall};
pub use mock_fetcher::{listing_body, MockPageFetcher};
