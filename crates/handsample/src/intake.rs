//! Accepting a contribution.
//!
//! [`Intake`] ties the upload policy, the upload directory and the metadata
//! store together. The image is always on disk before its record is
//! appended, and nothing is appended when the image could not be saved.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{RejectReason, Result};
use crate::record::{format_timestamp, Draft, SubmissionRecord};
use crate::storage::{MetadataStore, StoreStats, UploadDir};
use crate::upload::{is_allowed, sanitize_filename, IncomingUpload, UploadPolicy};

/// File name of the metadata document inside the data directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Name of the upload directory inside the data directory.
pub const UPLOAD_DIR_NAME: &str = "uploads";

/// The contribution pipeline behind the upload step.
#[derive(Debug)]
pub struct Intake {
    store: MetadataStore,
    uploads: UploadDir,
    policy: UploadPolicy,
}

impl Intake {
    /// Assemble an intake from its parts.
    #[must_use]
    pub fn new(store: MetadataStore, uploads: UploadDir, policy: UploadPolicy) -> Self {
        Self {
            store,
            uploads,
            policy,
        }
    }

    /// Open the store and upload directory laid out under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if either location cannot be created.
    pub fn open(data_dir: &Path, policy: UploadPolicy) -> Result<Self> {
        let store = MetadataStore::open(data_dir.join(METADATA_FILE_NAME))?;
        let uploads = UploadDir::open(data_dir.join(UPLOAD_DIR_NAME))?;
        Ok(Self::new(store, uploads, policy))
    }

    /// Open the intake described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage locations cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(
            &config.data_dir(),
            UploadPolicy::new(config.upload.file_prefix.clone()),
        )
    }

    /// The metadata store.
    #[must_use]
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// The upload directory.
    #[must_use]
    pub fn uploads(&self) -> &UploadDir {
        &self.uploads
    }

    /// Validate, save and record one upload against `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UploadRejected`] for an empty filename or a
    /// disallowed type, [`crate::Error::UploadSave`] if the image cannot be
    /// written, and a storage error if the record cannot be appended. In the
    /// last case the saved image is removed again.
    pub fn accept(&self, draft: &Draft, upload: &IncomingUpload) -> Result<SubmissionRecord> {
        if upload.filename.is_empty() {
            return Err(RejectReason::EmptyFilename.into());
        }
        if !is_allowed(&upload.filename, upload.content_type.as_deref()) {
            debug!(
                "Rejected {:?} ({:?})",
                upload.filename, upload.content_type
            );
            return Err(RejectReason::DisallowedType.into());
        }

        let now = Utc::now();
        let original_name = sanitize_filename(&upload.filename);
        let filename = self.policy.storage_name_at(&upload.filename, now);

        self.uploads.save(&filename, &upload.bytes)?;

        let record = SubmissionRecord::new(
            filename,
            original_name,
            format_timestamp(now),
            draft.clone(),
        );
        if let Err(e) = self.store.append(&record) {
            error!("Could not record {}: {}", record.filename, e);
            self.uploads.remove(&record.filename);
            return Err(e);
        }

        info!(
            "Accepted {} as {} ({} bytes)",
            record.original_name,
            record.filename,
            upload.bytes.len()
        );
        Ok(record)
    }

    /// Total number of recorded contributions.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata document cannot be read.
    pub fn contribution_count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Statistics about the metadata document.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata document cannot be read.
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}
