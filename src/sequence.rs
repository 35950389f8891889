//! Entry Sequence
//!
//! Lazy, forward-only traversal of the persisted entry chain.

use std::marker::PhantomData;

use crate::archive::ArchiveStore;
use crate::entry::FeedEntry;
use crate::error::{CacheError, Result};
use crate::record::EntryRecord;

/// Iterator over cached entries between two storage keys.
///
/// Walks the chain one record per `next()` call: load the record at the
/// cursor key, reconstruct its entry, then move the cursor to the
/// record's forward pointer. The end key is yielded inclusively; a chain
/// that runs out of forward pointers before reaching the end key simply
/// ends early. Nothing is validated beyond what traversal itself
/// observes, so a cyclic chain diverges unless a `limit` was configured,
/// in which case exceeding it yields one `BrokenChain` error and stops.
///
/// Any error (I/O, deserialization, reconstruction) is yielded through
/// the stream and ends the traversal.
pub struct EntrySequence<'a, E: FeedEntry> {
    store: &'a ArchiveStore,

    /// Key of the next record to load; `None` once the walk is over
    cursor: Option<String>,

    /// Last key to yield (inclusive)
    end_key: Option<String>,

    /// Records visited so far
    steps: usize,

    /// Optional safety bound on `steps`
    limit: Option<usize>,

    _entry: PhantomData<E>,
}

impl<'a, E: FeedEntry> EntrySequence<'a, E> {
    /// Create a traversal from `start_key` to `end_key` (inclusive).
    ///
    /// A `None` start key produces an empty sequence.
    pub(crate) fn new(
        store: &'a ArchiveStore,
        start_key: Option<String>,
        end_key: Option<String>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            store,
            cursor: start_key,
            end_key,
            steps: 0,
            limit,
            _entry: PhantomData,
        }
    }
}

impl<'a, E: FeedEntry> Iterator for EntrySequence<'a, E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        let current_key = self.cursor.take()?;

        if let Some(limit) = self.limit {
            if self.steps >= limit {
                return Some(Err(CacheError::BrokenChain { steps: self.steps }));
            }
        }
        self.steps += 1;

        let record = match self
            .store
            .read_blob(&current_key)
            .and_then(|bytes| EntryRecord::from_bytes(&bytes))
        {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };

        let entry = match E::from_raw_content(&record.raw_content) {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };

        // Stop after the end key; otherwise follow the forward pointer
        // (a missing pointer ends the walk on the next call).
        if self.end_key.as_deref() != Some(current_key.as_str()) {
            self.cursor = record.next_key;
        }

        Some(Ok(entry))
    }
}
