//! Local song catalog store.
//!
//! The store is the mirror: one keyed row per remote song, upserted by the
//! crawler and consumed by the acquisition pipeline. Everything goes through
//! the [`SongStore`] trait so the rest of the system never sees SQL.

mod sqlite;
mod traits;
mod types;

pub use sqlite::SqliteStore;
pub use traits::SongStore;
pub use types::{SongRecord, StoreError, WantedSong};
