//! Persisted record types and codec
//!
//! Two document shapes live inside the archive container: one
//! [`EntryRecord`] per cached feed entry, and a single [`Bookmark`] at a
//! well-known key tracking how far ingestion has progressed. Both are
//! stored as pretty-printed JSON so a container can be inspected with
//! standard tools.

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// One cached feed entry plus its forward pointer.
///
/// `next_key` holds the storage key of the chronologically following
/// entry, or `None` while this record is the newest known entry. The
/// chain of `next_key` pointers is the only ordering information the
/// cache persists; traversal never compares ids or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    /// Original raw content of the entry, exactly as fetched
    pub raw_content: String,

    /// Storage key of the next newer entry, if one is known
    pub next_key: Option<String>,
}

/// Ingestion progress bookmark.
///
/// `first_key` addresses the oldest entry ever cached and is written at
/// most once; only `last_key` advances as new batches arrive. Both absent
/// means the cache is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Storage key of the oldest cached entry
    pub first_key: Option<String>,

    /// Storage key of the newest cached entry
    pub last_key: Option<String>,
}

impl EntryRecord {
    /// Serialize to the stored JSON form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Deserialize from stored bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

impl Bookmark {
    /// Serialize to the stored JSON form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Deserialize from stored bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}
