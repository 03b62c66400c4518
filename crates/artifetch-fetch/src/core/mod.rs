//! Pure transformations used by the download pipeline.
//!
//! Nothing in here touches the filesystem or the network.

mod hint;
mod retry;
mod target;

pub use hint::{allow_list_link, dedup_fallback_warning};
pub use retry::{RetryPolicy, retry_delay};
pub use target::{relative_item_path, resolve_target_path};
