//! Storage layer for handsample.
//!
//! This module owns the metadata document (the ordered JSON ledger of every
//! accepted submission) and the flat directory of uploaded images.

pub mod atomic;
pub mod uploads;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::record::{format_timestamp, SubmissionRecord};

pub use atomic::write_json_atomic;
pub use uploads::UploadDir;

/// Append-only ledger of submissions backed by a single JSON document.
///
/// The document is only ever replaced as a whole through
/// [`write_json_atomic`], so readers see either the state before or after an
/// append. Appends through one store are serialized; separate processes
/// appending to the same file can still lose each other's updates.
#[derive(Debug)]
pub struct MetadataStore {
    /// Path to the metadata document.
    path: PathBuf,
    /// Held for the whole read-modify-write of an append.
    writer: Mutex<()>,
}

/// Outcome of reading the backing document.
#[derive(Debug)]
enum Document {
    Missing,
    Parsed(Vec<SubmissionRecord>),
    Corrupt(serde_json::Error),
}

impl MetadataStore {
    /// Bind a store to the document at `path`.
    ///
    /// Creates the parent directories if they don't exist. The document
    /// itself is created on the first append.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Metadata document at {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(()),
        })
    }

    /// Get the path to the metadata document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in arrival order.
    ///
    /// A missing document is an empty history. So is a document that does
    /// not parse; that case is logged, never silently swallowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    pub fn load(&self) -> Result<Vec<SubmissionRecord>> {
        match self.read_document()? {
            Document::Missing => Ok(Vec::new()),
            Document::Parsed(records) => Ok(records),
            Document::Corrupt(err) => {
                warn!(
                    "Metadata document {} is not valid, treating as empty: {}",
                    self.path.display(),
                    err
                );
                Ok(Vec::new())
            }
        }
    }

    /// Append a record and atomically rewrite the document.
    ///
    /// If the current document is corrupt it is copied aside first, so the
    /// rewrite never discards history without a backup.
    ///
    /// Returns the number of records after the append.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read, backed up or
    /// replaced. The document on disk is unchanged in that case.
    pub fn append(&self, record: &SubmissionRecord) -> Result<usize> {
        let _guard = self.writer.lock();

        let mut records = match self.read_document()? {
            Document::Missing => Vec::new(),
            Document::Parsed(records) => records,
            Document::Corrupt(err) => {
                let backup = self.backup_corrupt()?;
                error!(
                    "Metadata document {} is not valid ({}); saved a copy to {} and starting a new history",
                    self.path.display(),
                    err,
                    backup.display()
                );
                Vec::new()
            }
        };

        records.push(record.clone());
        write_json_atomic(&self.path, &records)?;

        info!(
            "Recorded {} ({} total)",
            record.filename,
            records.len()
        );
        Ok(records.len())
    }

    /// Number of records currently persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    pub fn stats(&self) -> Result<StoreStats> {
        let records = self.load()?;
        let document_size_bytes = std::fs::metadata(&self.path).map_or(0, |m| m.len());

        Ok(StoreStats {
            total_records: records.len(),
            newest_timestamp: records.last().map(|r| r.timestamp.clone()),
            document_size_bytes,
        })
    }

    fn read_document(&self) -> Result<Document> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::Missing),
            Err(source) => {
                return Err(Error::MetadataRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(match serde_json::from_slice(&bytes) {
            Ok(records) => Document::Parsed(records),
            Err(err) => Document::Corrupt(err),
        })
    }

    /// Copy the current document to `<name>.corrupt-<timestamp>`.
    fn backup_corrupt(&self) -> Result<PathBuf> {
        self.backup_corrupt_stamped(&format_timestamp(Utc::now()))
    }

    /// Copy the current document aside under a name no other backup holds.
    ///
    /// Backups from the same second get a `.1`, `.2`, ... suffix.
    fn backup_corrupt_stamped(&self, stamp: &str) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "metadata".into(), |n| n.to_string_lossy());
        let base = format!("{name}.corrupt-{stamp}");

        let mut attempt = 0u32;
        loop {
            let candidate = if attempt == 0 {
                self.path.with_file_name(&base)
            } else {
                self.path.with_file_name(format!("{base}.{attempt}"))
            };
            let write_err = |source| Error::MetadataWrite {
                path: candidate.clone(),
                source,
            };

            let mut backup = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(write_err(e)),
            };

            let copied = File::open(&self.path)
                .and_then(|mut source| std::io::copy(&mut source, &mut backup))
                .and_then(|_| backup.sync_all());
            if let Err(e) = copied {
                let _ = std::fs::remove_file(&candidate);
                return Err(write_err(e));
            }
            return Ok(candidate);
        }
    }
}

/// Statistics about the metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of records stored.
    pub total_records: usize,
    /// Timestamp of the most recently appended record.
    pub newest_timestamp: Option<String>,
    /// Size of the document in bytes (0 if it doesn't exist yet).
    pub document_size_bytes: u64,
}
