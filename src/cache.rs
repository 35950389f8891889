//! Entry Cache
//!
//! The core coordinator: persists feed entries as a singly-linked chain
//! of records inside the archive container, maintains the ingestion
//! bookmark, and hands out lazy ordered traversals.
//!
//! ## Responsibilities
//! - Derive storage keys from entry ids and write linked records
//! - Keep the bookmark pointing at the oldest and newest cached entries
//! - Reconstruct entries from stored raw content on reads
//! - Destroy the whole container on `clear`
//!
//! ## Concurrency Model: Single Writer
//!
//! All operations are synchronous and block on storage I/O. Every public
//! operation is its own container transaction; nothing is cached between
//! calls, and the bookmark is re-read from storage at the start of every
//! call that needs it. One logical writer is assumed. Reads only ever
//! observe committed records, so concurrent reads are safe among
//! themselves, but a write and its `advance_bookmark` are two separate
//! transactions: a crash between them leaves the new record persisted
//! yet unreachable until a later `advance_bookmark` covers it.

use std::marker::PhantomData;
use std::path::Path;

use crate::archive::ArchiveStore;
use crate::config::Config;
use crate::entry::FeedEntry;
use crate::error::Result;
use crate::keys::derive_key;
use crate::record::{Bookmark, EntryRecord};
use crate::sequence::EntrySequence;

/// Persistent cache of feed entries in original arrival order
pub struct EntryCache<E: FeedEntry> {
    /// Cache configuration
    config: Config,

    /// Single-file container holding records and the bookmark
    store: ArchiveStore,

    _entry: PhantomData<E>,
}

impl<E: FeedEntry> EntryCache<E> {
    // =========================================================================
    // Internal Key Constants
    // =========================================================================
    const BOOKMARK_KEY: &'static str = "current_state.json";

    /// Open or create a cache with the given config.
    ///
    /// Creates the parent directory of the container path; the container
    /// itself appears on the first write.
    pub fn open(config: Config) -> Result<Self> {
        let store = ArchiveStore::new(&config.archive_path)?;
        Ok(Self {
            config,
            store,
            _entry: PhantomData,
        })
    }

    /// Open with a container path (convenience method)
    ///
    /// Uses default config with the specified archive path
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().archive_path(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persist one entry, linked forward to `next_entry`.
    ///
    /// The record lands at the key derived from the entry's id, so
    /// writing the same entry again overwrites its previous record. The
    /// bookmark is not touched; callers make a batch reachable by calling
    /// [`advance_bookmark`](Self::advance_bookmark) once all its writes
    /// have succeeded.
    ///
    /// `next_entry` is the chronologically following entry, or `None`
    /// when this entry is currently the newest known one.
    pub fn write(&self, entry: &E, next_entry: Option<&E>) -> Result<()> {
        let key = derive_key(entry.entry_id())?;
        let next_key = next_entry
            .map(|next| derive_key(next.entry_id()))
            .transpose()?;

        tracing::debug!(key = %key, next = ?next_key, "writing entry record");

        let record = EntryRecord {
            raw_content: entry.raw_content().to_string(),
            next_key,
        };
        self.store.write_blob(&key, &record.to_bytes()?)
    }

    /// Bootstrap the cache from the newest entry of a feed.
    ///
    /// No-op when `latest_entry` is `None` (nothing to bootstrap from).
    /// Otherwise writes the entry with no forward pointer and points both
    /// ends of the bookmark at it. Intended for the first-ever run
    /// against a feed.
    pub fn set_initial_state(&self, latest_entry: Option<&E>) -> Result<()> {
        let Some(latest_entry) = latest_entry else {
            return Ok(());
        };

        self.write(latest_entry, None)?;
        self.advance_bookmark(latest_entry, latest_entry)
    }

    /// Record that a batch of new entries has been fully written.
    ///
    /// Moves `lastKey` to the most recent new entry unconditionally;
    /// `firstKey` is set only if it was never set before, and is never
    /// overwritten afterwards.
    ///
    /// Caller contract: invoke exactly once per ingested batch, after
    /// every `write` of that batch has succeeded, passing the true oldest
    /// and newest entries of the batch. The arguments are not validated
    /// against the written records.
    pub fn advance_bookmark(&self, oldest_new_entry: &E, most_recent_new_entry: &E) -> Result<()> {
        let mut bookmark = self.load_bookmark()?;

        bookmark.last_key = Some(derive_key(most_recent_new_entry.entry_id())?);
        if bookmark.first_key.is_none() {
            bookmark.first_key = Some(derive_key(oldest_new_entry.entry_id())?);
        }

        tracing::debug!(
            first = ?bookmark.first_key,
            last = ?bookmark.last_key,
            "advancing bookmark"
        );

        self.store
            .write_blob(Self::BOOKMARK_KEY, &bookmark.to_bytes()?)
    }

    /// Delete the entire container: every record and the bookmark.
    /// Irreversible.
    pub fn clear(&self) -> Result<()> {
        tracing::debug!(path = %self.config.archive_path.display(), "clearing cache");
        self.store.delete()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether a bookmark has ever been persisted
    pub fn has_state(&self) -> Result<bool> {
        self.store.exists(Self::BOOKMARK_KEY)
    }

    /// The oldest cached entry, or `None` on an empty cache
    pub fn first(&self) -> Result<Option<E>> {
        let bookmark = self.load_bookmark()?;
        self.entry_at(bookmark.first_key.as_deref())
    }

    /// The newest reachable entry, or `None` on an empty cache
    pub fn latest(&self) -> Result<Option<E>> {
        let bookmark = self.load_bookmark()?;
        self.entry_at(bookmark.last_key.as_deref())
    }

    /// Lazy traversal over every reachable entry, oldest to newest.
    ///
    /// Empty sequence on an empty cache.
    pub fn all_entries(&self) -> Result<EntrySequence<'_, E>> {
        let bookmark = self.load_bookmark()?;
        Ok(EntrySequence::new(
            &self.store,
            bookmark.first_key,
            bookmark.last_key,
            self.config.traversal_limit,
        ))
    }

    /// Lazy traversal from `from_entry` to `to_entry`, both inclusive
    pub fn entries(&self, from_entry: &E, to_entry: &E) -> Result<EntrySequence<'_, E>> {
        Ok(EntrySequence::new(
            &self.store,
            Some(derive_key(from_entry.entry_id())?),
            Some(derive_key(to_entry.entry_id())?),
            self.config.traversal_limit,
        ))
    }

    // =========================================================================
    // Bookmark I/O
    // =========================================================================

    /// Load the bookmark, treating an absent blob as an empty bookmark.
    ///
    /// This is the one place a NotFound is absorbed rather than
    /// propagated; any other failure surfaces.
    fn load_bookmark(&self) -> Result<Bookmark> {
        if !self.has_state()? {
            return Ok(Bookmark::default());
        }
        let bytes = self.store.read_blob(Self::BOOKMARK_KEY)?;
        Bookmark::from_bytes(&bytes)
    }

    /// Load the record at a bookmarked key and reconstruct its entry
    fn entry_at(&self, key: Option<&str>) -> Result<Option<E>> {
        let Some(key) = key else {
            return Ok(None);
        };
        let record = EntryRecord::from_bytes(&self.store.read_blob(key)?)?;
        E::from_raw_content(&record.raw_content).map(Some)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the container path
    pub fn archive_path(&self) -> &Path {
        self.store.path()
    }
}
