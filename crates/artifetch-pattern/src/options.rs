use serde::{Deserialize, Serialize};

/// Switches controlling how a glob pattern is interpreted.
///
/// `MatchOptions::default()` is conventional shell-glob behaviour (every switch
/// off). Artifact filtering uses [`MatchOptions::artifact_defaults`] instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MatchOptions {
    /// Let wildcards match path segments starting with `.`
    pub dot:                 bool,
    /// Case-insensitive matching
    pub no_case:             bool,
    /// Treat `\` as a path separator in both patterns and paths
    pub allow_windows_paths: bool,
    /// Disable `{a,b}` brace expansion
    pub no_brace:            bool,
    /// Treat `**` like `*`
    pub no_globstar:         bool,
    /// Do not treat a leading `#` as a comment
    pub no_comment:          bool,
    /// Do not treat a leading `!` as negation
    pub no_negate:           bool,
    /// Invert the include/exclude parity of leading `!` runs
    pub flip_negate:         bool,
    /// Match slash-free patterns against the last path segment only
    pub match_base:          bool,
}

impl MatchOptions {
    pub fn new() -> Self { Self::default() }

    /// Options used when the caller supplies none for artifact filtering:
    /// dotfiles match, braces are literal, backslashes are separators on
    /// Windows only.
    pub fn artifact_defaults() -> Self {
        Self {
            dot: true,
            no_brace: true,
            allow_windows_paths: cfg!(windows),
            ..Self::default()
        }
    }

    pub fn dot(mut self, dot: bool) -> Self {
        self.dot = dot;
        self
    }

    pub fn no_case(mut self, no_case: bool) -> Self {
        self.no_case = no_case;
        self
    }

    pub fn allow_windows_paths(mut self, allow: bool) -> Self {
        self.allow_windows_paths = allow;
        self
    }

    pub fn no_brace(mut self, no_brace: bool) -> Self {
        self.no_brace = no_brace;
        self
    }

    pub fn no_globstar(mut self, no_globstar: bool) -> Self {
        self.no_globstar = no_globstar;
        self
    }

    pub fn no_comment(mut self, no_comment: bool) -> Self {
        self.no_comment = no_comment;
        self
    }

    pub fn no_negate(mut self, no_negate: bool) -> Self {
        self.no_negate = no_negate;
        self
    }

    pub fn flip_negate(mut self, flip_negate: bool) -> Self {
        self.flip_negate = flip_negate;
        self
    }

    pub fn match_base(mut self, match_base: bool) -> Self {
        self.match_base = match_base;
        self
    }
}
