use std::fs;

use artifetch::{
    ArtifactProvider, BuildArtifact, CancellationToken, DownloadParameters, Error, FetchError,
    MatchOptions, RemoteItem, TarBackend,
};
use artifetch_fetch::BlobReference;
use artifetch_fetch::effects::mock::{MemoryContainer, MemoryDedupStore};
use tempfile::TempDir;

fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

fn drop_artifact() -> BuildArtifact { BuildArtifact::in_container(1, "drop") }

fn drop_container() -> MemoryContainer {
    MemoryContainer::new()
        .with_folder("drop")
        .with_folder("drop/bin")
        .with_file("drop/bin/app.dll", "dll")
        .with_file("drop/bin/app.pdb", "pdb")
        .with_file("drop/.config", "hidden")
        .with_file("drop/readme.md", "readme")
        .with_folder("logs")
        .with_file("logs/build.log", "log")
}

#[tokio::test]
async fn test_items_are_filtered_in_listing_order() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path()).patterns(["**", "!**/*.pdb"]);
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();

    let items = provider
        .get_artifact_items(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap();

    let paths: Vec<_> = items.iter().map(|item| item.path.as_str()).collect();
    // dotfiles match by default; the other artifact is not listed
    assert_eq!(paths, ["drop", "drop/bin", "drop/bin/app.dll", "drop/.config", "drop/readme.md"]);
}

#[tokio::test]
async fn test_custom_match_options_replace_the_defaults() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path())
        .patterns(["**/*.{dll,md}"])
        .match_options(MatchOptions::default());
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();

    let items = provider
        .get_artifact_items(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap();

    let paths: Vec<_> = items.iter().map(|item| item.path.as_str()).collect();
    assert_eq!(paths, ["drop/bin/app.dll", "drop/readme.md"]);
}

#[tokio::test]
async fn test_single_artifact_download() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path()).patterns(["**/*.dll", "**/*.md"]);
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();

    let download = provider
        .download_single_artifact(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(download.reports.len(), 1);
    assert_eq!(download.statistics.files_downloaded(), 2);
    assert!(download.tars.is_none());
    assert_eq!(fs::read_to_string(temp.path().join("bin/app.dll")).unwrap(), "dll");
    assert!(!temp.path().join("bin/app.pdb").exists());
}

#[tokio::test]
async fn test_multiple_artifacts_get_their_own_directories() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path());
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();
    let artifacts = [
        BuildArtifact::in_container(1, "drop"),
        BuildArtifact::in_container(1, "logs"),
    ];

    let download = provider
        .download_multiple_artifacts(&artifacts, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(download.reports.len(), 2);
    assert_eq!(download.statistics.files_downloaded(), 5);
    assert_eq!(fs::read_to_string(temp.path().join("drop/readme.md")).unwrap(), "readme");
    assert_eq!(fs::read_to_string(temp.path().join("logs/build.log")).unwrap(), "log");
}

#[tokio::test]
async fn test_multiple_artifacts_can_share_the_target() {
    let temp = TempDir::new().unwrap();
    let parameters =
        DownloadParameters::new(temp.path()).append_artifact_name_to_target_path(false);
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();
    let artifacts = [
        BuildArtifact::in_container(1, "drop"),
        BuildArtifact::in_container(1, "logs"),
    ];

    provider
        .download_multiple_artifacts(&artifacts, &CancellationToken::new())
        .await
        .unwrap();

    assert!(temp.path().join("readme.md").is_file());
    assert!(temp.path().join("build.log").is_file());
}

#[tokio::test]
async fn test_tars_extracted_once_across_artifacts() {
    let temp = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let container = MemoryContainer::new()
        .with_file("app/app.tar", tar_bytes(&[("bin/app", "app")]))
        .with_file("docs/docs.tar", tar_bytes(&[("index.html", "docs")]))
        .with_file("docs/notes.txt", "notes");
    let parameters = DownloadParameters::new(temp.path())
        .extract_tars(true)
        .tar_backend(TarBackend::Builtin)
        .extracted_tars_temp_path(scratch.path());
    let provider = ArtifactProvider::new(container, parameters).unwrap();
    let artifacts = [
        BuildArtifact::in_container(3, "app"),
        BuildArtifact::in_container(3, "docs"),
    ];

    let download = provider
        .download_multiple_artifacts(&artifacts, &CancellationToken::new())
        .await
        .unwrap();

    let tars = download.tars.unwrap();
    assert_eq!(tars.count(), 2);
    assert!(download.warnings.is_empty());

    // content keeps each archive's directory relative to the shared root
    let extracted = temp.path().join("extracted_tars");
    assert_eq!(fs::read_to_string(extracted.join("app/bin/app")).unwrap(), "app");
    assert_eq!(fs::read_to_string(extracted.join("docs/index.html")).unwrap(), "docs");
    assert!(!temp.path().join("app/app.tar").exists());
    assert!(temp.path().join("docs/notes.txt").exists());
}

#[tokio::test]
async fn test_missing_tars_are_a_warning() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path())
        .extract_tars(true)
        .tar_backend(TarBackend::Builtin);
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();

    let download = provider
        .download_single_artifact(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(download.tars.as_ref().map(|tars| tars.count()), Some(0));
    assert_eq!(download.warnings.len(), 1);
    assert!(!temp.path().join("extracted_tars").exists());
}

#[tokio::test]
async fn test_dedup_fallback_warning_reaches_the_caller() {
    let temp = TempDir::new().unwrap();
    let container = MemoryContainer::new().with_item(
        RemoteItem::file("drop/blob.bin", 4).with_blob(BlobReference::new("h")),
        "blob",
    );
    let provider = ArtifactProvider::new(container, DownloadParameters::new(temp.path()))
        .unwrap()
        .with_dedup_store(MemoryDedupStore::new().unreachable());

    let download = provider
        .download_single_artifact(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(download.warnings.len(), 1);
    assert_eq!(fs::read_to_string(temp.path().join("blob.bin")).unwrap(), "blob");
}

#[tokio::test]
async fn test_integrity_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let container =
        MemoryContainer::new().with_item(RemoteItem::file("drop/truncated.bin", 64), "short");
    let parameters = DownloadParameters::new(temp.path()).check_downloaded_files(true);
    let provider = ArtifactProvider::new(container, parameters).unwrap();

    let err = provider
        .download_single_artifact(&drop_artifact(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(FetchError::IntegrityCheckFailed { .. })));
    assert!(err.to_string().contains("drop/truncated.bin"));
}

#[tokio::test]
async fn test_malformed_resource_data() {
    let temp = TempDir::new().unwrap();
    let parameters = DownloadParameters::new(temp.path());
    let provider = ArtifactProvider::new(drop_container(), parameters).unwrap();

    let err = provider
        .download_single_artifact(&BuildArtifact::new("drop", "drop"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(FetchError::InvalidLocator(_))));
}

#[test]
fn test_invalid_parameters_are_rejected_up_front() {
    let result = ArtifactProvider::new(drop_container(), DownloadParameters::default());
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
