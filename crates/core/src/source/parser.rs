//! Pure parser for raw listing pages.
//!
//! The remote returns `{ "data": { "songs": [ { "file": {..}, "data": {..} } ] } }`
//! where `file` carries the download metadata and `data` the song metadata.
//! Parsing does no I/O and never touches the store.

use serde_json::Value;
use tracing::debug;

use super::types::ParsedPage;
use crate::store::SongRecord;

/// Extracts catalog records from a raw page body.
///
/// Entries missing either sub-object (or where one is not a JSON object)
/// are skipped rather than failing the page; a non-empty listing that
/// produces zero valid records is a parse anomaly and reported as
/// [`ParsedPage::Malformed`].
pub fn parse_page(page: u64, body: &Value) -> ParsedPage {
    let Some(songs) = body
        .get("data")
        .and_then(|d| d.get("songs"))
        .and_then(Value::as_array)
    else {
        debug!(page, "listing body has no data.songs array");
        return ParsedPage::Malformed;
    };

    if songs.is_empty() {
        return ParsedPage::Empty;
    }

    let mut records = Vec::with_capacity(songs.len());
    for entry in songs {
        let (Some(file), Some(meta)) = (
            entry.get("file").filter(|v| v.is_object()),
            entry.get("data").filter(|v| v.is_object()),
        ) else {
            debug!(page, "skipping entry without file/data objects");
            continue;
        };

        let Some(file_id) = string_field(file, "file_id") else {
            debug!(page, "skipping entry without file_id");
            continue;
        };

        let mut record = SongRecord::observed(
            file_id,
            string_field(meta, "artist").unwrap_or_default(),
            string_field(meta, "title").unwrap_or_default(),
            string_field(file, "download_url").unwrap_or_default(),
        );
        record.diff_drums = int_field(file, "diff_drums");
        record.diff_guitar = int_field(file, "diff_guitar");
        record.diff_bass = int_field(file, "diff_bass");
        record.diff_vocals = int_field(file, "diff_vocals");

        records.push(record);
    }

    if records.is_empty() {
        // Non-empty listing, zero valid entries: the shape changed under us.
        return ParsedPage::Malformed;
    }

    ParsedPage::Records(records)
}

/// Reads a field as a string, accepting numeric values (file ids are
/// sometimes serialized as integers).
fn string_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads an optional integer rating, accepting string-encoded numbers.
fn int_field(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
