//! Archive Store
//!
//! A single-file tar container mapping hierarchical path-like keys to
//! opaque byte blobs. This is the only module that touches the disk.
//!
//! ## Responsibilities
//! - Create the container lazily on the first write
//! - Upsert one blob per key (rewriting a key replaces its old bytes)
//! - Materialize intermediate directory entries as keys require them
//! - Tear the whole container down on `delete`
//!
//! Every operation opens and closes the container independently; no file
//! handle survives across calls. That bounds how long the file is held
//! but gives up atomicity across calls: two operations are two separate
//! container transactions. Writes rebuild the container into a temp file
//! and rename it over the old one, so a crash mid-write leaves the
//! previous container intact and a finished write is always fully
//! flushed and closed.
//!
//! Concurrent writers are unsupported. A second process mutating the
//! same container is not detected here; whatever the filesystem does
//! surfaces as an I/O error.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder, EntryType, Header};

use crate::error::{CacheError, Result};

/// One entry held in memory while a container is rebuilt
enum StoredEntry {
    Dir(String),
    Blob { key: String, bytes: Vec<u8> },
}

impl StoredEntry {
    fn key(&self) -> &str {
        match self {
            StoredEntry::Dir(key) => key,
            StoredEntry::Blob { key, .. } => key,
        }
    }
}

/// Single-file blob container addressed by path-like keys
pub struct ArchiveStore {
    /// Location of the container file; may not exist yet
    path: PathBuf,
}

impl ArchiveStore {
    /// Create a store rooted at the given container path.
    ///
    /// Creates the parent directory of the container if needed. The
    /// container file itself is only created by the first `write_blob`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// Path of the container file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a blob under a key, creating the container and any missing
    /// intermediate directory entries.
    ///
    /// An existing blob under the same key is replaced; the container
    /// never holds two entries for one key.
    pub fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self.load_entries()?;

        // Materialize missing parent directory entries, shallowest first
        for dir in ancestor_dirs(key) {
            if !entries.iter().any(|e| e.key() == dir) {
                entries.push(StoredEntry::Dir(dir));
            }
        }

        // Upsert the blob itself
        match entries.iter_mut().find(|e| e.key() == key) {
            Some(StoredEntry::Blob { bytes: existing, .. }) => {
                *existing = bytes.to_vec();
            }
            Some(StoredEntry::Dir(_)) => {
                return Err(CacheError::Archive(format!(
                    "key '{}' already exists as a directory",
                    key
                )));
            }
            None => {
                entries.push(StoredEntry::Blob {
                    key: key.to_string(),
                    bytes: bytes.to_vec(),
                });
            }
        }

        self.write_container(&entries)
    }

    /// Read the blob stored under a key.
    ///
    /// Returns `BlobNotFound` if the container file does not exist yet or
    /// the key is absent from it.
    pub fn read_blob(&self, key: &str) -> Result<Vec<u8>> {
        if !self.path.exists() {
            return Err(CacheError::BlobNotFound(key.to_string()));
        }

        let file = File::open(&self.path)?;
        let mut archive = Archive::new(file);

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            if entry_key(&entry)? == key {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                return Ok(bytes);
            }
        }

        Err(CacheError::BlobNotFound(key.to_string()))
    }

    /// Check whether a key is present.
    ///
    /// `false` when the container file itself has never been created.
    pub fn exists(&self, key: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        let file = File::open(&self.path)?;
        let mut archive = Archive::new(file);

        for entry in archive.entries()? {
            let entry = entry?;
            if entry_key(&entry)? == key {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Remove the entire container irrecoverably.
    ///
    /// Idempotent: deleting a container that never existed is a success.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Container I/O
    // =========================================================================

    /// Load every entry of the container into memory, preserving order.
    ///
    /// An absent container reads as empty.
    fn load_entries(&self) -> Result<Vec<StoredEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let mut archive = Archive::new(file);
        let mut loaded = Vec::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let key = entry_key(&entry)?;
            let kind = entry.header().entry_type();

            if kind.is_dir() {
                loaded.push(StoredEntry::Dir(key));
            } else if kind.is_file() {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                loaded.push(StoredEntry::Blob { key, bytes });
            } else {
                // Anything else in the container is not ours
                return Err(CacheError::Archive(format!(
                    "unexpected entry type {:?} at '{}'",
                    kind, key
                )));
            }
        }

        Ok(loaded)
    }

    /// Rebuild the container from the given entries: write a fresh tar to
    /// a temp file, fsync it, and rename it over the old container.
    fn write_container(&self, entries: &[StoredEntry]) -> Result<()> {
        let tmp_path = self.tmp_path();

        let file = File::create(&tmp_path)?;
        let mut builder = Builder::new(BufWriter::new(file));

        for entry in entries {
            match entry {
                StoredEntry::Dir(key) => {
                    let mut header = Header::new_gnu();
                    header.set_entry_type(EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    builder.append_data(&mut header, format!("{}/", key), io::empty())?;
                }
                StoredEntry::Blob { key, bytes } => {
                    let mut header = Header::new_gnu();
                    header.set_size(bytes.len() as u64);
                    header.set_mode(0o644);
                    builder.append_data(&mut header, key, bytes.as_slice())?;
                }
            }
        }

        let writer = builder.into_inner()?;
        let file = writer
            .into_inner()
            .map_err(|e| CacheError::Archive(format!("flush failed: {}", e)))?;
        file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Temp file used while rebuilding the container
    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

/// Key of a tar entry, with the directory convention's trailing slash
/// stripped so directories and blobs compare uniformly.
fn entry_key<R: Read>(entry: &tar::Entry<'_, R>) -> Result<String> {
    let path = entry.path()?;
    Ok(path.to_string_lossy().trim_end_matches('/').to_string())
}

/// Proper ancestor directories of a key, shallowest first:
/// `a/b/c.json` yields `a`, then `a/b`.
fn ancestor_dirs(key: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut prefix = String::new();

    let segments: Vec<&str> = key.split('/').collect();
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        dirs.push(prefix.clone());
    }

    dirs
}
