//! Flat directory holding accepted images.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The directory every accepted image is written to.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Open the upload directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|source| Error::DirectoryCreate {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Get the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Full path a stored file would have.
    #[must_use]
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Durably write `bytes` under `filename`.
    ///
    /// The file is created with create-new semantics and is never
    /// overwritten. A partially written file is removed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadSave`] if the file cannot be created, written or
    /// synced, and [`Error::Internal`] if `filename` is not a plain file name.
    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        if !is_plain_name(filename) {
            return Err(Error::internal(format!(
                "refusing to store upload under {filename:?}"
            )));
        }

        let path = self.path_for(filename);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| Error::UploadSave {
                path: path.clone(),
                source,
            })?;

        let written = file.write_all(bytes).and_then(|()| file.sync_all());
        if let Err(source) = written {
            drop(file);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Could not remove partial upload {}: {}", path.display(), e);
            }
            return Err(Error::UploadSave { path, source });
        }

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Best-effort removal of a stored file.
    pub fn remove(&self, filename: &str) {
        if !is_plain_name(filename) {
            return;
        }
        let path = self.path_for(filename);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }

    /// Count regular files in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn file_count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.root)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// A name with no directory components.
fn is_plain_name(filename: &str) -> bool {
    !filename.is_empty()
        && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename)
}
