use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Run `tar xf <archive> --directory <dir>`.
///
/// A non-zero exit status or any output on stderr fails the extraction.
pub(super) async fn extract(archive: &Path, dir: &Path) -> Result<()> {
    let output = Command::new("tar")
        .arg("xf")
        .arg(archive)
        .arg("--directory")
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| Error::Spawn {
            archive: archive.to_path_buf(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if !output.status.success() || !stderr.is_empty() {
        return Err(Error::ToolFailed {
            archive: archive.to_path_buf(),
            code: output.status.code(),
            stderr,
        });
    }

    debug!(archive = %archive.display(), "tar tool finished");
    Ok(())
}
