//! Glob matching and ordered include/exclude filtering for artifact items.
//!
//! - [`Pattern`] compiles one glob (with `*`, `**`, `?`, character classes
//!   and `{a,b}` alternation) into a predicate over relative paths.
//! - [`PatternFilter`] applies an ordered pattern list with negation,
//!   comment lines and union/subtract semantics.

mod brace;
mod error;
mod filter;
mod glob;
mod options;

pub use brace::{MAX_EXPANSIONS, expand_braces};
pub use error::{PatternError, Result};
pub use filter::{DecisionSet, FilterRule, PathKey, PatternFilter, Polarity, filter};
pub use glob::{Pattern, is_match};
pub use options::MatchOptions;
