use std::fs::File;
use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};
use crate::sanitize::{sanitize_entry_path, sanitize_symlink_target};

/// Unpack `archive` into `dir` with the `tar` crate.
///
/// Every entry is validated before anything is written; an entry or link
/// that would land outside `dir` fails the whole archive.
pub(super) fn extract(archive: &Path, dir: &Path) -> Result<()> {
    let failed = |source| Error::ExtractionFailed {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
    let mut tar = tar::Archive::new(file);
    tar.set_preserve_permissions(true);
    tar.set_overwrite(true);

    for entry in tar.entries().map_err(failed)? {
        let mut entry = entry.map_err(failed)?;
        let entry_path = entry.path().map_err(failed)?.into_owned();
        let resolved = sanitize_entry_path(&entry_path, dir)?;

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            if let Some(target) = entry.link_name().map_err(failed)? {
                if kind.is_symlink() {
                    sanitize_symlink_target(&target, &resolved, dir)?;
                } else {
                    // hard link targets are relative to the archive root
                    sanitize_entry_path(&target, dir)?;
                }
            }
        }

        trace!(entry = %entry_path.display(), "unpacking");
        entry.unpack_in(dir).map_err(failed)?;
    }

    Ok(())
}
