//! Extraction of tar archives found among downloaded artifact files.
//!
//! # Architecture
//!
//! - `extract/` - Discovery, per-backend extraction, relocation into `extracted_tars`
//! - `sanitize.rs` - Entry path and symlink validation (zip-slip prevention)
//! - `options.rs` - Backend selection

mod error;
pub mod extract;
pub mod options;
mod sanitize;

pub use error::{Error, Result};
pub use extract::{EXTRACTED_TARS_DIR, TarExtractor, TarReport, is_tar_archive};
pub use options::{ExtractOptions, TarBackend};
pub use sanitize::{sanitize_entry_path, sanitize_symlink_target};
