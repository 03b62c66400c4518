use std::fs;
use std::path::Path;

use artifetch_archive::{EXTRACTED_TARS_DIR, Error, TarBackend, TarExtractor};
use tempfile::TempDir;

fn write_tar(path: &Path, entries: &[(&str, &str)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut builder = tar::Builder::new(fs::File::create(path).unwrap());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.finish().unwrap();
}

/// Entry names the builder would refuse (`..`) are written into the raw header.
fn write_raw_tar(path: &Path, name: &str, content: &str) {
    let mut header = tar::Header::new_gnu();
    let raw = &mut header.as_gnu_mut().unwrap().name;
    raw[..name.len()].copy_from_slice(name.as_bytes());
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();

    let mut builder = tar::Builder::new(fs::File::create(path).unwrap());
    builder.append(&header, content.as_bytes()).unwrap();
    builder.finish().unwrap();
}

fn tar_tool_available() -> bool {
    std::process::Command::new("tar")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_builtin_extracts_mirrors_layout_and_deletes_archives() {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let nested = root.path().join("images/layer.tar");
    let top = root.path().join("top.tar");
    let plain = root.path().join("readme.txt");
    write_tar(&nested, &[("etc/config", "nested"), ("bin/tool", "tool")]);
    write_tar(&top, &[("top.txt", "top")]);
    fs::write(&plain, "not an archive").unwrap();

    let report = TarExtractor::new()
        .backend(TarBackend::Builtin)
        .extract_all([&nested, &top, &plain], root.path(), scratch.path())
        .await
        .unwrap();

    assert_eq!(report.count(), 2);
    assert!(report.warning.is_none());
    assert!(!nested.exists());
    assert!(!top.exists());
    assert!(plain.exists());

    let extracted = root.path().join(EXTRACTED_TARS_DIR);
    assert_eq!(report.target.as_deref(), Some(extracted.as_path()));
    assert_eq!(fs::read_to_string(extracted.join("images/etc/config")).unwrap(), "nested");
    assert_eq!(fs::read_to_string(extracted.join("images/bin/tool")).unwrap(), "tool");
    assert_eq!(fs::read_to_string(extracted.join("top.txt")).unwrap(), "top");
}

#[tokio::test]
async fn test_merge_keeps_existing_content_and_overwrites_files() {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let extracted = root.path().join(EXTRACTED_TARS_DIR);
    fs::create_dir_all(extracted.join("data")).unwrap();
    fs::write(extracted.join("data/keep.txt"), "keep").unwrap();
    fs::write(extracted.join("data/shared.txt"), "old").unwrap();

    let archive = root.path().join("update.tar");
    write_tar(&archive, &[("data/shared.txt", "new"), ("data/added.txt", "added")]);

    TarExtractor::new()
        .backend(TarBackend::Builtin)
        .extract_all([&archive], root.path(), scratch.path())
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(extracted.join("data/keep.txt")).unwrap(), "keep");
    assert_eq!(fs::read_to_string(extracted.join("data/shared.txt")).unwrap(), "new");
    assert_eq!(fs::read_to_string(extracted.join("data/added.txt")).unwrap(), "added");
}

#[tokio::test]
async fn test_no_archives_is_a_warning() {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let file = root.path().join("app.tar.gz");
    fs::write(&file, "gzip, not tar").unwrap();

    let report = TarExtractor::new()
        .extract_all([&file], root.path(), scratch.path())
        .await
        .unwrap();

    assert_eq!(report.count(), 0);
    assert!(report.warning.is_some());
    assert!(!root.path().join(EXTRACTED_TARS_DIR).exists());
    assert!(file.exists());
}

#[tokio::test]
async fn test_escaping_entry_fails_extraction() {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let archive = root.path().join("evil.tar");
    write_raw_tar(&archive, "../../evil.txt", "gotcha");

    let err = TarExtractor::new()
        .backend(TarBackend::Builtin)
        .extract_all([&archive], root.path(), scratch.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ZipSlip { .. }), "{err}");
    // a failed archive is left in place
    assert!(archive.exists());
}

#[tokio::test]
async fn test_archive_outside_root_is_rejected() {
    let root = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let archive = elsewhere.path().join("stray.tar");
    write_tar(&archive, &[("x", "x")]);

    let err = TarExtractor::new()
        .backend(TarBackend::Builtin)
        .extract_all([&archive], root.path(), scratch.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OutsideRoot { .. }));
}

#[tokio::test]
async fn test_system_tar_extracts() {
    if !tar_tool_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let archive = root.path().join("drop/bundle.tar");
    write_tar(&archive, &[("inner/file.txt", "system")]);

    let report = TarExtractor::new()
        .backend(TarBackend::System)
        .extract_all([&archive], root.path(), scratch.path())
        .await
        .unwrap();

    assert_eq!(report.count(), 1);
    let extracted = root.path().join(EXTRACTED_TARS_DIR).join("drop/inner/file.txt");
    assert_eq!(fs::read_to_string(extracted).unwrap(), "system");
}

#[tokio::test]
async fn test_system_tar_failure_carries_stderr() {
    if !tar_tool_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let archive = root.path().join("broken.tar");
    fs::write(&archive, "definitely not a tar archive, just some text").unwrap();

    let err = TarExtractor::new()
        .backend(TarBackend::System)
        .extract_all([&archive], root.path(), scratch.path())
        .await
        .unwrap_err();

    let Error::ToolFailed { archive: failed, stderr, .. } = &err else {
        panic!("expected tool failure, got {err}");
    };
    assert_eq!(failed, &archive);
    assert!(!stderr.is_empty());
}
