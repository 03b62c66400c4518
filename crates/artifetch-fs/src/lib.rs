//! Filesystem primitives used while materialising downloaded artifacts.
//!
//! Everything here is synchronous; async callers wrap these in
//! `tokio::task::spawn_blocking` or use the `tokio::fs` equivalents.

mod error;
pub mod primitives;

pub use error::{Error, Result};
pub use primitives::{MergeReport, ensure_dir, ensure_parent, file_len, merge_dir};
