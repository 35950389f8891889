//! # feedcache
//!
//! A persistent entry cache for incremental activity-feed polling:
//! - Durable records addressed by deterministic id-derived keys
//! - Crash-resumable ingestion bookmark
//! - Ordered replay reconstructed purely from persisted forward pointers
//! - Single-file archive container, opened per operation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Feed Poller                              │
//! │        (fetch / parse / dispatch — not this crate)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ write / advance_bookmark / entries
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    EntryCache                                │
//! │        (keys ◂ derive, records ◂ JSON codec)                 │
//! └─────────┬──────────────────────────────────────┬────────────┘
//!           │                                      │
//!           ▼                                      ▼
//!    ┌─────────────┐                       ┌──────────────┐
//!    │ ArchiveStore│                       │ EntrySequence│
//!    │ (tar file)  │◂──────────────────────│ (lazy walk)  │
//!    └─────────────┘                       └──────────────┘
//! ```
//!
//! Entries are stored as a singly-linked chain: each record carries the
//! storage key of the chronologically next entry, and a bookmark blob
//! tracks the oldest and newest reachable records. Ingestion resumes
//! after a restart from the bookmark alone.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entry;
pub mod keys;
pub mod record;
pub mod archive;
pub mod cache;
pub mod sequence;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::Config;
pub use entry::{AtomEntry, FeedEntry};
pub use archive::ArchiveStore;
pub use cache::EntryCache;
pub use sequence::EntrySequence;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of feedcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
