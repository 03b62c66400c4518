use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path below `base`.
///
/// Absolute entries and entries whose `..` components climb out of `base`
/// are rejected.
pub fn sanitize_entry_path(
    entry_path: impl AsRef<Path>,
    base: impl AsRef<Path>,
) -> Result<PathBuf> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();
    let normalized = normalize_path(entry_path);

    if normalized.has_root() || entry_path.is_absolute() {
        return Err(Error::ZipSlip {
            entry:    entry_path.to_path_buf(),
            resolved: normalized,
        });
    }

    let resolved = normalize_path(&base.join(entry_path));
    if !resolved.starts_with(normalize_path(base)) {
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }

    Ok(resolved)
}

/// Resolve a symlink target relative to the link's own location.
///
/// `symlink_location` is the already-sanitized path of the link itself.
pub fn sanitize_symlink_target(
    target: impl AsRef<Path>,
    symlink_location: impl AsRef<Path>,
    base: impl AsRef<Path>,
) -> Result<PathBuf> {
    let target = target.as_ref();
    let symlink_location = symlink_location.as_ref();
    let base = normalize_path(base.as_ref());

    if target.is_absolute() || target.has_root() {
        return Err(Error::AbsoluteSymlinkTarget {
            target:  target.to_path_buf(),
            symlink: symlink_location.to_path_buf(),
        });
    }

    let resolved = symlink_location
        .parent()
        .map(|parent| parent.join(target))
        .unwrap_or_else(|| target.to_path_buf());
    let absolute = if resolved.is_absolute() { resolved } else { base.join(resolved) };
    let final_path = normalize_path(&absolute);

    if !final_path.starts_with(&base) {
        return Err(Error::SymlinkEscape {
            target:   target.to_path_buf(),
            resolved: final_path,
        });
    }

    Ok(final_path)
}

/// Lexically resolve `.` and `..`; `..` at the root stays at the root.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
