//! Compilation of a single glob expression into a path predicate.

use crate::brace::expand_braces;
use crate::error::{PatternError, Result};
use crate::options::MatchOptions;
use regex::Regex;
use std::borrow::Cow;

/// POSIX bracket expressions accepted inside a character class.
const POSIX_CLASSES: &[&str] = &[
    "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

#[derive(Debug, Clone)]
enum Segment {
    /// `**`: zero or more whole path segments
    GlobStar,
    /// No wildcards; compared directly (lowercased under `no_case`)
    Literal(String),
    /// Anything with `*`, `?` or a character class
    Wild {
        regex:        Regex,
        /// Segment starts with a literal `.`, so dot-entries are fair game
        explicit_dot: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Comment,
    Empty,
    Glob,
}

/// A compiled glob pattern.
///
/// Brace alternatives are compiled independently and OR-ed together.
#[derive(Debug, Clone)]
pub struct Pattern {
    source:       String,
    options:      MatchOptions,
    kind:         Kind,
    negate:       bool,
    alternatives: Vec<Vec<Segment>>,
}

impl Pattern {
    pub fn compile(pattern: &str, options: MatchOptions) -> Result<Self> {
        let source = pattern.to_owned();
        let mut body = if options.allow_windows_paths {
            pattern.replace('\\', "/")
        } else {
            pattern.to_owned()
        };

        let kind = if !options.no_comment && body.starts_with('#') {
            Kind::Comment
        } else if body.is_empty() {
            Kind::Empty
        } else {
            Kind::Glob
        };
        if kind != Kind::Glob {
            return Ok(Self {
                source,
                options,
                kind,
                negate: false,
                alternatives: Vec::new(),
            });
        }

        let mut negate = false;
        if !options.no_negate {
            let negations = body.chars().take_while(|c| *c == '!').count();
            negate = negations % 2 == 1;
            body.drain(..negations);
        }

        let expansions = if options.no_brace {
            vec![body]
        } else {
            expand_braces(&body.replace('\\', "/"))?
        };

        let alternatives = expansions
            .iter()
            .map(|expansion| compile_alternative(expansion, &options))
            .collect::<Result<_>>()?;

        Ok(Self {
            source,
            options,
            kind,
            negate,
            alternatives,
        })
    }

    pub fn source(&self) -> &str { &self.source }

    pub fn options(&self) -> &MatchOptions { &self.options }

    pub fn is_comment(&self) -> bool { self.kind == Kind::Comment }

    pub fn is_negated(&self) -> bool { self.negate }

    /// Test a `/`-separated relative path.
    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            Kind::Comment => return false,
            Kind::Empty => return path.is_empty(),
            Kind::Glob => {}
        }

        let path: Cow<'_, str> = if self.options.allow_windows_paths {
            Cow::Owned(path.replace('\\', "/"))
        } else {
            Cow::Borrowed(path)
        };
        let file = split_slashes(&path);

        for alternative in &self.alternatives {
            let hit = if self.options.match_base && alternative.len() == 1 {
                let base = file.iter().rev().find(|s| !s.is_empty()).copied().unwrap_or("");
                match_segments(&[base], alternative, &self.options)
            } else {
                match_segments(&file, alternative, &self.options)
            };

            if hit {
                if self.options.flip_negate {
                    return true;
                }
                return !self.negate;
            }
        }

        if self.options.flip_negate {
            return false;
        }
        self.negate
    }
}

/// Compile `pattern` and test `path` in one go.
pub fn is_match(pattern: &str, path: &str, options: MatchOptions) -> Result<bool> {
    Ok(Pattern::compile(pattern, options)?.matches(path))
}

fn compile_alternative(pattern: &str, options: &MatchOptions) -> Result<Vec<Segment>> {
    split_slashes(pattern)
        .into_iter()
        .map(|segment| compile_segment(segment, pattern, options))
        .collect()
}

fn compile_segment(segment: &str, pattern: &str, options: &MatchOptions) -> Result<Segment> {
    if segment == "**" && !options.no_globstar {
        return Ok(Segment::GlobStar);
    }

    let chars: Vec<char> = segment.chars().collect();
    let escapes = !options.allow_windows_paths;

    let mut regex = String::new();
    let mut literal = String::new();
    let mut magic = false;
    let mut explicit_dot = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if escapes && i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                if i == 0 && escaped == '.' {
                    explicit_dot = true;
                }
                push_literal(&mut regex, &mut literal, escaped);
                i += 2;
                continue;
            }
            '*' => {
                magic = true;
                // Collapse runs; `a**b` is just `a*b`.
                if !regex.ends_with("[^/]*?") {
                    regex.push_str("[^/]*?");
                }
            }
            '?' => {
                magic = true;
                regex.push_str("[^/]");
            }
            '[' => match parse_class(&chars, i, escapes) {
                Some((class, next)) => {
                    magic = true;
                    regex.push_str(&class);
                    i = next;
                    continue;
                }
                None => push_literal(&mut regex, &mut literal, c),
            },
            _ => {
                if i == 0 && c == '.' {
                    explicit_dot = true;
                }
                push_literal(&mut regex, &mut literal, c);
            }
        }
        i += 1;
    }

    if !magic {
        let literal = if options.no_case {
            literal.to_lowercase()
        } else {
            literal
        };
        return Ok(Segment::Literal(literal));
    }

    let flags = if options.no_case { "(?si)" } else { "(?s)" };
    let regex = Regex::new(&format!("{flags}^{regex}$")).map_err(|source| PatternError::Compile {
        pattern: pattern.to_owned(),
        source,
    })?;

    Ok(Segment::Wild {
        regex,
        explicit_dot,
    })
}

fn push_literal(regex: &mut String, literal: &mut String, c: char) {
    let mut buf = [0u8; 4];
    regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
    literal.push(c);
}

/// Translate `[...]` starting at `open`.
///
/// `None` when the class never closes or does not compile (a reversed range
/// such as `[z-a]`); the `[` is then matched literally.
fn parse_class(chars: &[char], open: usize, escapes: bool) -> Option<(String, usize)> {
    let mut j = open + 1;
    let negated = matches!(chars.get(j), Some('!' | '^'));
    if negated {
        j += 1;
    }

    let mut body = String::new();
    let mut first = true;
    loop {
        let c = *chars.get(j)?;
        match c {
            ']' if !first => {
                let class = format!("[{}{}]", if negated { "^" } else { "" }, body);
                return Regex::new(&class).is_ok().then_some((class, j + 1));
            }
            '[' if chars.get(j + 1) == Some(&':') => {
                let rest: String = chars[j + 2..].iter().collect();
                match rest.find(":]") {
                    Some(end) if POSIX_CLASSES.contains(&&rest[..end]) => {
                        body.push_str(&format!("[:{}:]", &rest[..end]));
                        j += 2 + rest[..end].chars().count() + 2;
                    }
                    _ => {
                        body.push_str(r"\[");
                        j += 1;
                    }
                }
            }
            '\\' if escapes && j + 1 < chars.len() => {
                push_class_char(&mut body, chars[j + 1]);
                j += 2;
            }
            '-' => {
                body.push('-');
                j += 1;
            }
            _ => {
                push_class_char(&mut body, c);
                j += 1;
            }
        }
        first = false;
    }
}

fn push_class_char(body: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~' | '-') {
        body.push('\\');
    }
    body.push(c);
}

/// Split on runs of `/`, keeping a leading and a trailing empty segment.
fn split_slashes(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' {
            parts.push(&s[start..i]);
            while i < bytes.len() && bytes[i] == b'/' {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

fn is_dot_entry(segment: &str) -> bool { segment == "." || segment == ".." }

fn hidden(segment: &str, options: &MatchOptions) -> bool {
    is_dot_entry(segment) || (!options.dot && segment.starts_with('.'))
}

fn match_segments(file: &[&str], pattern: &[Segment], options: &MatchOptions) -> bool {
    let mut fi = 0;
    let mut pi = 0;

    while fi < file.len() && pi < pattern.len() {
        let f = file[fi];
        match &pattern[pi] {
            Segment::GlobStar => {
                if pi + 1 == pattern.len() {
                    return file[fi..].iter().all(|s| !hidden(s, options));
                }
                for fr in fi..file.len() {
                    if match_segments(&file[fr..], &pattern[pi + 1..], options) {
                        return true;
                    }
                    if hidden(file[fr], options) {
                        break;
                    }
                }
                return false;
            }
            Segment::Literal(literal) => {
                let equal = if options.no_case {
                    f.to_lowercase() == *literal
                } else {
                    f == literal
                };
                if !equal {
                    return false;
                }
            }
            Segment::Wild {
                regex,
                explicit_dot,
            } => {
                if !explicit_dot && hidden(f, options) {
                    return false;
                }
                if !regex.is_match(f) {
                    return false;
                }
            }
        }
        fi += 1;
        pi += 1;
    }

    if fi == file.len() && pi == pattern.len() {
        true
    } else if fi == file.len() {
        false
    } else {
        // Pattern exhausted; only a trailing slash on the path may remain.
        fi == file.len() - 1 && file[fi].is_empty()
    }
}
