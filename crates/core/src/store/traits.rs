//! Trait for song store backends.

use std::collections::HashSet;

use super::types::{SongRecord, StoreError, WantedSong};

/// Storage backend for the mirrored song catalog.
///
/// The crawler and the acquisition pipeline only ever go through this
/// interface; no caller constructs SQL or knows about the schema. Writes
/// must be serialized by the implementation (single-writer connection);
/// reads may happen concurrently with each other.
pub trait SongStore: Send + Sync {
    /// Returns the subset of `file_ids` already present in the store,
    /// as a single batched query.
    fn existing_ids(&self, file_ids: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Inserts new records and refreshes the listing-derived fields of
    /// existing ones. The acquisition state of an existing row (`wanted`,
    /// `downloaded`, `download_path`) is never touched, so re-upserting a
    /// page is idempotent.
    fn upsert(&self, records: &[SongRecord]) -> Result<(), StoreError>;

    /// File ids marked wanted that have not been downloaded yet.
    fn wanted_undownloaded(&self) -> Result<Vec<String>, StoreError>;

    /// Resolves artist, title and download URL for the given file ids.
    /// Unknown ids are silently absent from the result.
    fn lookup(&self, file_ids: &[String]) -> Result<Vec<WantedSong>, StoreError>;

    /// Records the produced package path and flips `downloaded` in the
    /// same write, preserving the invariant that a path is only present
    /// on downloaded records.
    fn record_download_path(&self, file_id: &str, path: &str) -> Result<(), StoreError>;

    /// Flips the user-controlled wanted flag. Called by external clients
    /// (and tests), never by the crawler.
    fn set_wanted(&self, file_id: &str, wanted: bool) -> Result<(), StoreError>;

    /// Fetches a single record by id.
    fn get(&self, file_id: &str) -> Result<Option<SongRecord>, StoreError>;
}
