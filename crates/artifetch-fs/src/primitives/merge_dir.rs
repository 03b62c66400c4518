use crate::primitives::dirs::ensure_dir;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Counts of what [`merge_dir`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Files (and symlinks) moved into the destination
    pub files_moved:    usize,
    /// Subset of `files_moved` that overwrote an existing destination file
    pub files_replaced: usize,
    /// Directories moved wholesale because the destination had no counterpart
    pub dirs_moved:     usize,
    /// Directories merged entry by entry into an existing counterpart
    pub dirs_merged:    usize,
}

/// Move the contents of `src` into `dest`.
///
/// Files overwrite their destination counterpart; directories that already
/// exist on the destination side are merged recursively instead of being
/// replaced. `src` itself is left in place (emptied of everything moved).
pub fn merge_dir(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<MergeReport> {
    let mut report = MergeReport::default();
    merge_into(src.as_ref(), dest.as_ref(), &mut report)?;
    Ok(report)
}

fn merge_into(src: &Path, dest: &Path, report: &mut MergeReport) -> Result<()> {
    ensure_dir(dest)?;

    for entry in fs::read_dir(src).map_err(|e| Error::Read {
        path:   src.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| Error::Read {
            path:   src.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| Error::Read {
            path:   entry.path(),
            source: e,
        })?;

        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_dir() {
            if dest_path.is_dir() {
                merge_into(&src_path, &dest_path, report)?;
                remove_merged_dir(&src_path)?;
                report.dirs_merged += 1;
            } else {
                move_path(&src_path, &dest_path, true)?;
                report.dirs_moved += 1;
            }
        } else {
            let replaced = fs::symlink_metadata(&dest_path).is_ok();
            move_path(&src_path, &dest_path, false)?;
            report.files_moved += 1;
            if replaced {
                report.files_replaced += 1;
            }
        }
    }

    Ok(())
}

/// Remove a source directory whose entries were all merged away.
///
/// An entry that appeared meanwhile keeps the directory in place.
fn remove_merged_dir(path: &Path) -> Result<()> {
    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {
            debug!(path = %path.display(), "merged directory not empty, leaving it");
            Ok(())
        }
        Err(e) => Err(Error::Write {
            path:   path.to_path_buf(),
            source: e,
        }),
    }
}

fn move_path(src: &Path, dest: &Path, is_dir: bool) -> Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            if is_dir {
                copy_dir_all(src, dest)?;
                fs::remove_dir_all(src).map_err(|e| Error::Write {
                    path:   src.to_path_buf(),
                    source: e,
                })
            } else {
                copy_entry(src, dest)?;
                fs::remove_file(src).map_err(|e| Error::Write {
                    path:   src.to_path_buf(),
                    source: e,
                })
            }
        }
        Err(e) => Err(Error::Write {
            path:   dest.to_path_buf(),
            source: e,
        }),
    }
}

fn copy_dir_all(src: &Path, dest: &Path) -> Result<()> {
    ensure_dir(dest)?;

    for entry in fs::read_dir(src).map_err(|e| Error::Read {
        path:   src.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| Error::Read {
            path:   src.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| Error::Read {
            path:   entry.path(),
            source: e,
        })?;

        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_all(&src_path, &dest_path)?;
        } else {
            copy_entry(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

fn copy_entry(src: &Path, dest: &Path) -> Result<()> {
    #[cfg(unix)]
    if fs::symlink_metadata(src).is_ok_and(|meta| meta.file_type().is_symlink()) {
        let target = fs::read_link(src).map_err(|e| Error::Read {
            path:   src.to_path_buf(),
            source: e,
        })?;
        match fs::remove_file(dest) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                return Err(Error::Write {
                    path:   dest.to_path_buf(),
                    source: e,
                });
            }
            _ => {}
        }
        return std::os::unix::fs::symlink(target, dest).map_err(|e| Error::Write {
            path:   dest.to_path_buf(),
            source: e,
        });
    }

    fs::copy(src, dest).map(drop).map_err(|e| Error::Write {
        path:   dest.to_path_buf(),
        source: e,
    })
}
