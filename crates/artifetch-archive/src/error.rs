use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive '{archive}' is not below the destination root '{root}'")]
    OutsideRoot { archive: PathBuf, root: PathBuf },

    #[error("failed to start the tar tool for '{archive}': {source}")]
    Spawn { archive: PathBuf, source: io::Error },

    #[error("tar extraction of '{archive}' failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        archive: PathBuf,
        code:    Option<i32>,
        stderr:  String,
    },

    #[error("zip-slip attack detected: entry '{entry}' resolves to '{resolved}'")]
    ZipSlip { entry: PathBuf, resolved: PathBuf },

    #[error("symlink target escapes extraction directory: '{target}' -> '{resolved}'")]
    SymlinkEscape { target: PathBuf, resolved: PathBuf },

    #[error("symlink target is absolute path: '{target}' in '{symlink}'")]
    AbsoluteSymlinkTarget { target: PathBuf, symlink: PathBuf },

    #[error("failed to extract '{archive}': {source}")]
    ExtractionFailed { archive: PathBuf, source: io::Error },

    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] artifetch_fs::Error),

    #[error("extraction task stopped unexpectedly: {0}")]
    Worker(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
