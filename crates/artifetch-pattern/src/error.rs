//! Error types for artifetch-pattern.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}' could not be compiled")]
    Compile {
        pattern: String,
        #[source]
        source:  regex::Error,
    },

    #[error("brace expansion of '{pattern}' exceeds {limit} alternatives")]
    TooManyExpansions { pattern: String, limit: usize },
}

pub type Result<T> = std::result::Result<T, PatternError>;
