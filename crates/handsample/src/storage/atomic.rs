//! Atomic replacement of JSON documents.
//!
//! The new content goes to a `meta_*.tmp` sibling, is flushed and synced, then
//! renamed over the target. A failed write drops the temporary file, so the
//! target only ever holds a complete old or complete new document.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::Builder;
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// Prefix of temporary files created next to the target.
pub const TEMP_PREFIX: &str = "meta_";

/// Suffix of temporary files created next to the target.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails and [`Error::MetadataWrite`]
/// if the temporary file cannot be created, written, synced or renamed. In
/// every error case the previous content of `path` is left untouched.
///
/// Once the rename has happened the new content is in place, so a failure to
/// sync the parent directory afterwards is logged and not reported.
pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    write_json_atomic_with(path, value, sync_dir)
}

fn write_json_atomic_with<T, F>(path: &Path, value: &T, sync_parent: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    let body = serde_json::to_vec_pretty(value)?;
    let write_err = |source: std::io::Error| Error::MetadataWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(write_err)?;
    trace!("Writing {} bytes to {}", body.len(), tmp.path().display());

    tmp.write_all(&body).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    if let Err(e) = sync_parent(parent) {
        warn!(
            "Replaced {} but could not sync {}: {}",
            path.display(),
            parent.display(),
            e
        );
    }
    Ok(())
}

/// Make the rename itself durable.
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::fs::File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}
