//! Error types for feedcache
//!
//! Provides a unified error type for all operations.
//!
//! Only one failure is ever absorbed instead of propagated: a missing
//! bookmark blob is treated as an empty bookmark by the cache layer.
//! Everything else surfaces to the caller, who owns retry and logging
//! policy.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for feedcache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Archive Container Errors
    // -------------------------------------------------------------------------
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    // -------------------------------------------------------------------------
    // Entry Errors
    // -------------------------------------------------------------------------
    #[error("Malformed entry id: {0}")]
    MalformedId(String),

    #[error("Malformed entry content: {0}")]
    MalformedContent(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Traversal Errors
    // -------------------------------------------------------------------------
    #[error("Broken entry chain: end key not reached after {steps} records")]
    BrokenChain { steps: usize },
}
