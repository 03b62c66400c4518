use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};

/// Strip the artifact name from an item path.
///
/// Item paths start with the artifact name: the artifact's own root entry is
/// exactly the name, everything else is `name/...`. A path shorter than the
/// name cannot belong to the artifact. Paths that do not carry the prefix are
/// returned unchanged.
pub fn relative_item_path<'a>(
    item_path: &'a str,
    artifact_name: &str,
    include_artifact_name: bool,
) -> Result<&'a str> {
    if include_artifact_name {
        return Ok(item_path);
    }

    if item_path.len() < artifact_name.len() {
        return Err(FetchError::PathShorterThanArtifact {
            path:     item_path.to_owned(),
            artifact: artifact_name.to_owned(),
        });
    }

    let stripped = if item_path.len() == artifact_name.len() {
        item_path.strip_prefix(artifact_name)
    } else {
        item_path
            .strip_prefix(artifact_name)
            .and_then(|rest| rest.strip_prefix('/'))
    };

    Ok(stripped.unwrap_or(item_path))
}

/// Local destination of an item under `root`.
///
/// `..` segments are rejected so a listing can never write outside `root`.
pub fn resolve_target_path(
    root: &Path,
    item_path: &str,
    artifact_name: &str,
    include_artifact_name: bool,
) -> Result<PathBuf> {
    let relative = relative_item_path(item_path, artifact_name, include_artifact_name)?;

    let mut target = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            return Err(FetchError::UnsafeItemPath(item_path.to_owned()));
        }
        target.push(segment);
    }
    Ok(target)
}
