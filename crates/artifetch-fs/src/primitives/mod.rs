pub mod dirs;
pub mod merge_dir;

pub use dirs::{ensure_dir, ensure_parent, file_len};
pub use merge_dir::{MergeReport, merge_dir};
