//! Upload validation and storage naming.
//!
//! Incoming files are accepted by extension and declared MIME type only; the
//! bytes themselves are never inspected. Accepted files are stored under a
//! generated name, so the contributor's filename never reaches the filesystem.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::record::format_timestamp;

/// Extensions accepted for upload, lower-cased with the leading dot.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Largest request body accepted on the upload endpoint.
pub const MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

/// Prefix of generated storage names unless configured otherwise.
pub const DEFAULT_FILE_PREFIX: &str = "banglaocr";

/// Name recorded when sanitizing leaves nothing behind.
const FALLBACK_NAME: &str = "upload";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Invalid regex pattern"));

/// A file received from the upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingUpload {
    /// Filename as sent by the client.
    pub filename: String,
    /// MIME type declared by the client, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Lower-cased extension of the final path component, with its dot.
///
/// Dotfiles such as `.png` have no extension.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    Path::new(last)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Check a filename and optional MIME type against the allow-list.
#[must_use]
pub fn is_allowed(filename: &str, mime_type: Option<&str>) -> bool {
    let Some(ext) = extension_of(filename) else {
        return false;
    };
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }
    match mime_type {
        Some(mime) if !mime.is_empty() => mime.starts_with("image/"),
        _ => true,
    }
}

/// Reduce a client-supplied filename to a safe, ASCII-only name.
///
/// Directory components are dropped, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is removed and leading or trailing `.`/`_` are
/// trimmed.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let joined = last.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Produces storage names for accepted uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    prefix: String,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PREFIX)
    }
}

impl UploadPolicy {
    /// Create a policy with the given storage-name prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The storage-name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a fresh storage name for `original_filename`, stamped now.
    #[must_use]
    pub fn generate_storage_name(&self, original_filename: &str) -> String {
        self.storage_name_at(original_filename, Utc::now())
    }

    /// Generate a storage name stamped with `at`.
    ///
    /// The layout is `<prefix>_<YYYYMMDD_HHMMSS>_<8 hex chars><ext>`, where
    /// the random suffix separates uploads landing in the same second and
    /// `ext` is the lower-cased extension of the original name.
    #[must_use]
    pub fn storage_name_at(&self, original_filename: &str, at: DateTime<Utc>) -> String {
        let suffix: u32 = rand::random();
        let ext = extension_of(original_filename).unwrap_or_default();
        format!(
            "{}_{}_{suffix:08x}{ext}",
            self.prefix,
            format_timestamp(at)
        )
    }
}
