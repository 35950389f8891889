//! Storage key derivation
//!
//! Maps a feed entry's id to the deterministic key its record is stored
//! under inside the archive container. The id is URI-shaped and its final
//! path segment is a numeric entry id; that number is split into a
//! shard/bucket pair so no single directory inside the container ever
//! holds more than [`SHARD_SIZE`] records, however large the corpus grows.
//!
//! Derivation is pure: same id in, same key out, no I/O. Identical ids
//! therefore address the identical record, which is what makes writes
//! idempotent by id.

use url::Url;

use crate::error::{CacheError, Result};

/// Number of records per bucket directory; also the number of buckets per
/// shard directory.
pub const SHARD_SIZE: u64 = 16384;

/// File extension of serialized records inside the container
pub const RECORD_EXT: &str = "json";

/// Derive the storage key for an entry id.
///
/// The id must parse as a URL whose last non-empty path segment is a
/// non-negative integer `n`. The key keeps every other path segment and
/// inserts two levels, `n / 16384` and `n % 16384`, before the record
/// file name:
///
/// ```text
/// https://host/api/v2/projects/x/feed/events/32769
///   => api/v2/projects/x/feed/events/2/1/32769.json
/// ```
///
/// Returns `MalformedId` if the id does not parse or its final segment is
/// not an integer. Callers are expected to hand over well-formed ids.
pub fn derive_key(entry_id: &str) -> Result<String> {
    let uri = Url::parse(entry_id)
        .map_err(|e| CacheError::MalformedId(format!("{}: {}", entry_id, e)))?;

    let segments: Vec<&str> = uri
        .path_segments()
        .map(|parts| parts.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let tail = segments
        .last()
        .ok_or_else(|| CacheError::MalformedId(format!("{}: empty path", entry_id)))?;

    let n: u64 = tail.parse().map_err(|_| {
        CacheError::MalformedId(format!("{}: final segment '{}' is not an integer", entry_id, tail))
    })?;

    let mut parts: Vec<String> = segments[..segments.len() - 1]
        .iter()
        .map(|s| s.to_string())
        .collect();
    parts.push((n / SHARD_SIZE).to_string());
    parts.push((n % SHARD_SIZE).to_string());
    parts.push(format!("{}.{}", n, RECORD_EXT));

    Ok(parts.join("/"))
}
