use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Create `path` and all missing ancestors.
///
/// Creating a directory that already exists is not an error, which makes the
/// call safe to issue concurrently for overlapping subtrees.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        // A concurrent creator may win the race for the last component.
        Err(_) if path.is_dir() => Ok(()),
        Err(_) if path.exists() => Err(Error::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::Write {
            path:   path.to_path_buf(),
            source: e,
        }),
    }
}

/// Create the immediate parent directory of `path`.
pub fn ensure_parent(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(()),
        Some(parent) => ensure_dir(parent),
        None => Err(Error::NoParent {
            path: path.to_path_buf(),
        }),
    }
}

/// Length in bytes of the file at `path`.
pub fn file_len(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| Error::Read {
            path:   path.to_path_buf(),
            source: e,
        })
}
