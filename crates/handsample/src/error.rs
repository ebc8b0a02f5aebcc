//! Error types for handsample.
//!
//! This module defines all error types used throughout the handsample crate,
//! separating client-caused rejections from storage and configuration failures.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why an upload was refused before anything was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The multipart body had no `photo` field.
    MissingFile,
    /// The `photo` field was present but carried an empty filename.
    EmptyFilename,
    /// Extension or declared MIME type is not in the allow-list.
    DisallowedType,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "No file uploaded"),
            Self::EmptyFilename => write!(f, "No selected file"),
            Self::DisallowedType => write!(f, "File type not allowed"),
        }
    }
}

/// The main error type for handsample operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Upload Errors ===
    /// The upload failed validation.
    #[error("{0}")]
    UploadRejected(RejectReason),

    /// The request body exceeded the upload limit.
    #[error("Uploaded file is too large (max {}MB)", .limit_bytes / (1024 * 1024))]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit_bytes: usize,
    },

    /// The multipart body could not be parsed.
    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    /// Writing the uploaded image to disk failed.
    #[error("failed to save upload to {path}: {source}")]
    UploadSave {
        /// Destination path of the image.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Storage Errors ===
    /// Reading the metadata document failed.
    #[error("failed to read metadata document {path}: {source}")]
    MetadataRead {
        /// Path to the metadata document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Atomically replacing the metadata document failed.
    #[error("failed to write metadata document {path}: {source}")]
    MetadataWrite {
        /// Path to the metadata document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for handsample operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<RejectReason> for Error {
    fn from(reason: RejectReason) -> Self {
        Self::UploadRejected(reason)
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a malformed upload error.
    #[must_use]
    pub fn malformed_upload(message: impl Into<String>) -> Self {
        Self::MalformedUpload(message.into())
    }

    /// Check if this error was caused by the client's request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UploadRejected(_) | Self::PayloadTooLarge { .. } | Self::MalformedUpload(_)
        )
    }

    /// Check if this error is a payload-too-large rejection.
    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}
