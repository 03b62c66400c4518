use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::data::RemoteItem;
use crate::error::{CorruptedItem, FetchError, Result};

/// Compare the on-disk size of every item with its listed length.
///
/// All mismatches are collected before failing, so the error names every
/// offending item rather than the first.
pub async fn verify_integrity<'a, I, R>(items: I, resolve: R) -> Result<()>
where
    I: IntoIterator<Item = &'a RemoteItem>,
    R: Fn(&RemoteItem) -> Result<PathBuf>,
{
    let mut checked = 0usize;
    let mut corrupted = Vec::new();

    for item in items {
        let local = resolve(item)?;
        let actual = match tokio::fs::metadata(&local).await {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(FetchError::io(local, e)),
        };
        checked += 1;

        if actual != Some(item.length) {
            warn!(
                path = %item.path,
                expected = item.length,
                actual = ?actual,
                "downloaded file does not match the listed size"
            );
            corrupted.push(CorruptedItem {
                path: item.path.clone(),
                local,
                expected: item.length,
                actual,
            });
        }
    }

    if corrupted.is_empty() {
        info!(files = checked, "integrity check passed");
        Ok(())
    } else {
        Err(FetchError::IntegrityCheckFailed { items: corrupted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reports_every_mismatch() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ok.bin"), [0u8; 4]).unwrap();
        std::fs::write(dir.path().join("short.bin"), [0u8; 2]).unwrap();

        let items = vec![
            RemoteItem::file("ok.bin", 4),
            RemoteItem::file("short.bin", 8),
            RemoteItem::file("missing.bin", 1),
        ];

        let err = verify_integrity(&items, |item| Ok(dir.path().join(&item.path)))
            .await
            .unwrap_err();

        let FetchError::IntegrityCheckFailed { items: corrupted } = err else {
            panic!("expected an integrity failure");
        };
        let paths: Vec<_> = corrupted.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["short.bin", "missing.bin"]);
        assert_eq!(corrupted[0].actual, Some(2));
        assert_eq!(corrupted[1].actual, None);
    }

    #[tokio::test]
    async fn test_all_matching() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "abc").unwrap();
        let items = [RemoteItem::file("a", 3)];

        verify_integrity(&items, |item| Ok(dir.path().join(&item.path)))
            .await
            .unwrap();
    }
}
