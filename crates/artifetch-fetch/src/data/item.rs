use artifetch_pattern::PathKey;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// Opaque content identifier in the dedup store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Where an item's bytes live in the content-addressable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobReference {
    pub content_id:  ContentId,
    #[serde(default)]
    pub compression: Compression,
}

impl BlobReference {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id:  ContentId::new(content_id),
            compression: Compression::None,
        }
    }

    pub fn gzip(mut self) -> Self {
        self.compression = Compression::Gzip;
        self
    }
}

/// One entry of a remote artifact listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Posix-style path, starting with the artifact name
    pub path:   String,
    pub kind:   ItemKind,
    /// Expected size in bytes; zero for folders
    #[serde(default)]
    pub length: u64,
    /// Present only when the content lives in the dedup store
    #[serde(default)]
    pub blob:   Option<BlobReference>,
}

impl RemoteItem {
    pub fn file(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::File,
            length,
            blob: None,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path:   path.into(),
            kind:   ItemKind::Folder,
            length: 0,
            blob:   None,
        }
    }

    pub fn with_blob(mut self, blob: BlobReference) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn is_file(&self) -> bool { self.kind == ItemKind::File }

    pub fn is_folder(&self) -> bool { self.kind == ItemKind::Folder }
}

impl PathKey for RemoteItem {
    fn path_key(&self) -> &str { &self.path }
}
