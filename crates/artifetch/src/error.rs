//! Error type of the artifact provider.

use std::io;
use std::path::PathBuf;

use artifetch_fetch::{FetchError, TransportError};
use artifetch_pattern::PatternError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to list items of artifact {artifact}")]
    Listing {
        artifact: String,
        #[source]
        source:   TransportError,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] artifetch_archive::Error),

    #[error(transparent)]
    Fs(#[from] artifetch_fs::Error),

    #[error("failed to create a scratch directory for tar extraction")]
    Scratch(#[source] io::Error),

    #[error("failed to read configuration {path}")]
    ConfigRead {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
