//! SQLite-backed song store implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::traits::SongStore;
use super::types::{SongRecord, StoreError, WantedSong};

/// Largest number of bound parameters used in a single statement. Batched
/// queries are chunked to stay well below SQLite's variable limit.
const MAX_BATCH_PARAMS: usize = 500;

/// SQLite-backed song store with a single-writer connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and bootstraps the schema.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- Mirrored catalog (one row per remote file id)
            CREATE TABLE IF NOT EXISTS songs (
                file_id TEXT PRIMARY KEY,
                artist TEXT NOT NULL,
                title TEXT NOT NULL,
                diff_drums INTEGER,
                diff_guitar INTEGER,
                diff_bass INTEGER,
                diff_vocals INTEGER,
                download_url TEXT NOT NULL,
                wanted INTEGER NOT NULL DEFAULT 0,
                downloaded INTEGER NOT NULL DEFAULT 0,
                download_path TEXT,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_songs_wanted ON songs(wanted, downloaded);
            CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // Lock poisoning only happens after a panic in another holder;
        // propagating it as a panic here is the least surprising option.
        self.conn.lock().expect("song store mutex poisoned")
    }

    fn placeholders(count: usize) -> String {
        let mut s = String::with_capacity(count * 2);
        for i in 0..count {
            if i > 0 {
                s.push(',');
            }
            s.push('?');
        }
        s
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> Result<SongRecord, rusqlite::Error> {
        Ok(SongRecord {
            file_id: row.get(0)?,
            artist: row.get(1)?,
            title: row.get(2)?,
            diff_drums: row.get(3)?,
            diff_guitar: row.get(4)?,
            diff_bass: row.get(5)?,
            diff_vocals: row.get(6)?,
            download_url: row.get(7)?,
            wanted: row.get(8)?,
            downloaded: row.get(9)?,
            download_path: row.get(10)?,
        })
    }
}

impl SongStore for SqliteStore {
    fn existing_ids(&self, file_ids: &[String]) -> Result<HashSet<String>, StoreError> {
        let conn = self.lock_conn();
        let mut existing = HashSet::new();

        for chunk in file_ids.chunks(MAX_BATCH_PARAMS) {
            let sql = format!(
                "SELECT file_id FROM songs WHERE file_id IN ({})",
                Self::placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for row in rows {
                existing.insert(row?);
            }
        }

        Ok(existing)
    }

    fn upsert(&self, records: &[SongRecord]) -> Result<(), StoreError> {
        let mut conn = self.lock_conn();
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO songs (
                    file_id, artist, title,
                    diff_drums, diff_guitar, diff_bass, diff_vocals,
                    download_url, wanted, downloaded, download_path,
                    first_seen_at, last_seen_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
                ON CONFLICT(file_id) DO UPDATE SET
                    artist = excluded.artist,
                    title = excluded.title,
                    diff_drums = excluded.diff_drums,
                    diff_guitar = excluded.diff_guitar,
                    diff_bass = excluded.diff_bass,
                    diff_vocals = excluded.diff_vocals,
                    download_url = excluded.download_url,
                    last_seen_at = excluded.last_seen_at
                "#,
            )?;

            for record in records {
                stmt.execute(params![
                    record.file_id,
                    record.artist,
                    record.title,
                    record.diff_drums,
                    record.diff_guitar,
                    record.diff_bass,
                    record.diff_vocals,
                    record.download_url,
                    record.wanted,
                    record.downloaded,
                    record.download_path,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn wanted_undownloaded(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT file_id FROM songs WHERE wanted = 1 AND downloaded = 0 ORDER BY file_id",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn lookup(&self, file_ids: &[String]) -> Result<Vec<WantedSong>, StoreError> {
        let conn = self.lock_conn();
        let mut songs = Vec::new();

        for chunk in file_ids.chunks(MAX_BATCH_PARAMS) {
            let sql = format!(
                "SELECT file_id, artist, title, download_url FROM songs WHERE file_id IN ({})",
                Self::placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok(WantedSong {
                    file_id: row.get(0)?,
                    artist: row.get(1)?,
                    title: row.get(2)?,
                    download_url: row.get(3)?,
                })
            })?;
            for row in rows {
                songs.push(row?);
            }
        }

        Ok(songs)
    }

    fn record_download_path(&self, file_id: &str, path: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn();
        let updated = conn.execute(
            "UPDATE songs SET downloaded = 1, download_path = ?2 WHERE file_id = ?1",
            params![file_id, path],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        Ok(())
    }

    fn set_wanted(&self, file_id: &str, wanted: bool) -> Result<(), StoreError> {
        let conn = self.lock_conn();
        let updated = conn.execute(
            "UPDATE songs SET wanted = ?2 WHERE file_id = ?1",
            params![file_id, wanted],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        Ok(())
    }

    fn get(&self, file_id: &str) -> Result<Option<SongRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT file_id, artist, title,
                   diff_drums, diff_guitar, diff_bass, diff_vocals,
                   download_url, wanted, downloaded, download_path
            FROM songs WHERE file_id = ?1
            "#,
        )?;
        let mut rows = stmt.query_map(params![file_id], Self::row_to_record)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(file_id: &str) -> SongRecord {
        let mut record = SongRecord::observed(
            file_id,
            "Artist",
            "Title",
            format!("/download/{}", file_id),
        );
        record.diff_drums = Some(3);
        record
    }

    #[test]
    fn test_upsert_and_existing_ids() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert(&[sample("a"), sample("b")]).unwrap();

        let ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let existing = store.existing_ids(&ids).unwrap();
        assert_eq!(existing.len(), 2);
        assert!(existing.contains("a"));
        assert!(existing.contains("b"));
        assert!(!existing.contains("c"));
    }

    #[test]
    fn test_existing_ids_empty_input() {
        let store = SqliteStore::in_memory().unwrap();
        let existing = store.existing_ids(&[]).unwrap();
        assert!(existing.is_empty());
    }

    #[test]
    fn test_upsert_preserves_acquisition_state() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert(&[sample("a")]).unwrap();
        store.set_wanted("a", true).unwrap();
        store.record_download_path("a", "/pkg/a.pkg").unwrap();

        // Re-observing the same record on a later page must not reset
        // what the user and the pipeline wrote.
        let mut refreshed = sample("a");
        refreshed.title = "Title (remaster)".to_string();
        store.upsert(&[refreshed]).unwrap();

        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.title, "Title (remaster)");
        assert!(record.wanted);
        assert!(record.downloaded);
        assert_eq!(record.download_path.as_deref(), Some("/pkg/a.pkg"));
    }

    #[test]
    fn test_upsert_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert(&[sample("a")]).unwrap();
        store.upsert(&[sample("a")]).unwrap();

        let existing = store.existing_ids(&["a".to_string()]).unwrap();
        assert_eq!(existing.len(), 1);
        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.diff_drums, Some(3));
    }

    #[test]
    fn test_wanted_undownloaded_filtering() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert(&[sample("a"), sample("b"), sample("c")])
            .unwrap();
        store.set_wanted("a", true).unwrap();
        store.set_wanted("b", true).unwrap();
        store.record_download_path("b", "/pkg/b.pkg").unwrap();

        let ids = store.wanted_undownloaded().unwrap();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_lookup() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert(&[sample("a")]).unwrap();

        let songs = store.lookup(&["a".to_string(), "missing".to_string()]).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].file_id, "a");
        assert_eq!(songs[0].download_url, "/download/a");
    }

    #[test]
    fn test_record_download_path_sets_downloaded() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert(&[sample("a")]).unwrap();
        store.record_download_path("a", "/pkg/a.pkg").unwrap();

        let record = store.get("a").unwrap().unwrap();
        assert!(record.downloaded);
        assert_eq!(record.download_path.as_deref(), Some("/pkg/a.pkg"));
    }

    #[test]
    fn test_record_download_path_unknown_id() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.record_download_path("nope", "/pkg/x.pkg");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_batched_query_chunks_large_input() {
        let store = SqliteStore::in_memory().unwrap();
        let records: Vec<SongRecord> = (0..1200).map(|i| sample(&format!("id-{}", i))).collect();
        store.upsert(&records).unwrap();

        let ids: Vec<String> = (0..1200).map(|i| format!("id-{}", i)).collect();
        let existing = store.existing_ids(&ids).unwrap();
        assert_eq!(existing.len(), 1200);
    }
}
