//! JSON state storage.
//!
//! Two files live next to each other:
//! - snapshot: last known state of every item, replaced wholesale each run
//! - history: append-only log of every run's observations
//!
//! Both are read leniently (missing or corrupt files degrade to empty state)
//! and written as pretty JSON through a temp file + rename.

pub mod diff;
pub mod history;
pub mod snapshot;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PersistenceError;

pub(crate) fn read_text(path: &Path) -> Result<String, PersistenceError> {
    fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    replace_file(path, text.as_bytes())
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
/// A failed write leaves the previous contents in place.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| PersistenceError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
