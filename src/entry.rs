//! Feed entry abstraction
//!
//! The cache stores entries by their raw content and rebuilds them from
//! that content on the way back out, so all it needs from an entry type
//! is an id, the raw content, and a reconstruction function. That seam
//! is the [`FeedEntry`] trait; fetching, pagination, and full entry
//! parsing live with the caller, not here.
//!
//! [`AtomEntry`] is the implementation shipped with the crate: an entry
//! is the raw XML snippet of an Atom `<entry>` element, identified by the
//! text of its `<id>` child.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CacheError, Result};

/// Interface the cache requires of a feed entry type.
///
/// Implementations must be able to round-trip through raw content:
/// `from_raw_content(e.raw_content())` must yield an entry equal in id
/// and raw content to `e`.
pub trait FeedEntry: Sized {
    /// URI-shaped id whose final path segment is the numeric entry id
    fn entry_id(&self) -> &str;

    /// Original raw content of the entry (stored verbatim)
    fn raw_content(&self) -> &str;

    /// Reconstruct an entry from previously stored raw content
    fn from_raw_content(raw: &str) -> Result<Self>;
}

/// Inner text of the first `<id>` element in a snippet
static ID_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<id[^<>]*>\s*([^<]*?)\s*</id>").unwrap());

/// A feed entry backed by a raw Atom `<entry>` XML snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomEntry {
    id: String,
    raw: String,
}

impl AtomEntry {
    /// Parse an Atom `<entry>` snippet, extracting its `<id>` element
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let id = ID_ELEMENT
            .captures(&raw)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                CacheError::MalformedContent("entry snippet has no <id> element".to_string())
            })?;

        Ok(Self { id, raw })
    }
}

impl FeedEntry for AtomEntry {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn raw_content(&self) -> &str {
        &self.raw
    }

    fn from_raw_content(raw: &str) -> Result<Self> {
        Self::new(raw)
    }
}
