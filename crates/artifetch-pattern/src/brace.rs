//! Bash-style brace expansion.
//!
//! `a{b,c}d` becomes `abd`, `acd`; `{1..3}` becomes `1`, `2`, `3`. Braces
//! without a top-level comma or range are kept literally, and a backslash
//! escapes the next character from expansion (the backslash is preserved
//! for the glob compiler).

use crate::error::{PatternError, Result};

/// Upper bound on the alternatives produced by a single pattern.
pub const MAX_EXPANSIONS: usize = 10_000;

/// Expand every brace group in `pattern`.
///
/// Always returns at least one element; a pattern without expandable braces
/// comes back unchanged.
pub fn expand_braces(pattern: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = pattern.chars().collect();
    expand(&chars, pattern)
}

fn expand(s: &[char], original: &str) -> Result<Vec<String>> {
    let Some((open, close)) = find_balanced(s) else {
        return Ok(vec![s.iter().collect()]);
    };

    let pre: String = s[..open].iter().collect();
    let body = &s[open + 1..close];
    let post = expand(&s[close + 1..], original)?;

    let alternatives = split_top_level(body);
    let middle = if alternatives.len() > 1 {
        let mut out = Vec::new();
        for alternative in alternatives {
            out.extend(expand(alternative, original)?);
        }
        out
    } else if let Some(sequence) = sequence(body, original)? {
        sequence
    } else {
        // `{x}` and `{}` are literal; nested groups inside still expand.
        expand(body, original)?
            .into_iter()
            .map(|inner| format!("{{{inner}}}"))
            .collect()
    };

    if middle.len().saturating_mul(post.len()) > MAX_EXPANSIONS {
        return Err(too_many(original));
    }

    let mut results = Vec::with_capacity(middle.len() * post.len());
    for m in &middle {
        for p in &post {
            results.push(format!("{pre}{m}{p}"));
        }
    }
    Ok(results)
}

/// First `{` (scanning left to right) that has a matching `}`.
fn find_balanced(s: &[char]) -> Option<(usize, usize)> {
    let mut k = 0;
    while k < s.len() {
        match s[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '{' => {
                if let Some(close) = closing_brace(s, k) {
                    return Some((k, close));
                }
            }
            _ => {}
        }
        k += 1;
    }
    None
}

fn closing_brace(s: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut k = open;
    while k < s.len() {
        match s[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(k);
                }
            }
            _ => {}
        }
        k += 1;
    }
    None
}

fn split_top_level(body: &[char]) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut k = 0;
    while k < body.len() {
        match body[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..k]);
                start = k + 1;
            }
            _ => {}
        }
        k += 1;
    }
    parts.push(&body[start.min(body.len())..]);
    parts
}

/// `{a..b}` or `{a..b..step}` over integers or single ASCII letters.
fn sequence(body: &[char], original: &str) -> Result<Option<Vec<String>>> {
    let body: String = body.iter().collect();
    let parts: Vec<&str> = body.split("..").collect();
    if !(parts.len() == 2 || parts.len() == 3) {
        return Ok(None);
    }

    let step = match parts.get(2) {
        Some(raw) => match raw.parse::<i64>() {
            Ok(step) => step.unsigned_abs().max(1),
            Err(_) => return Ok(None),
        },
        None => 1,
    };

    if let (Ok(start), Ok(end)) = (parts[0].parse::<i64>(), parts[1].parse::<i64>()) {
        let count = span(start, end, step)
            .filter(|count| *count <= MAX_EXPANSIONS as u64)
            .ok_or_else(|| too_many(original))?;

        let width = if is_padded(parts[0]) || is_padded(parts[1]) {
            parts[0].len().max(parts[1].len())
        } else {
            0
        };

        let values = stepped(start, end, step, count)
            .map(|n| format!("{n:0width$}"))
            .collect();
        return Ok(Some(values));
    }

    let (Some(start), Some(end)) = (single_letter(parts[0]), single_letter(parts[1])) else {
        return Ok(None);
    };
    let (start, end) = (i64::from(u32::from(start)), i64::from(u32::from(end)));
    let count = span(start, end, step).unwrap_or(1);
    let values = stepped(start, end, step, count)
        .filter_map(|n| char::from_u32(n as u32))
        .filter(|c| *c != '\\')
        .map(String::from)
        .collect();
    Ok(Some(values))
}

/// Number of values in the sequence; `None` when it does not fit a `u64`.
fn span(start: i64, end: i64, step: u64) -> Option<u64> {
    (start.abs_diff(end) / step).checked_add(1)
}

/// Every value stays between `start` and `end`, so only the offsets need `i128`.
fn stepped(start: i64, end: i64, step: u64, count: u64) -> impl Iterator<Item = i64> {
    let direction: i128 = if start <= end { 1 } else { -1 };
    (0..count).map(move |i| {
        (i128::from(start) + direction * i128::from(step) * i128::from(i)) as i64
    })
}

fn is_padded(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    digits.len() > 1 && digits.starts_with('0')
}

fn single_letter(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

fn too_many(pattern: &str) -> PatternError {
    PatternError::TooManyExpansions {
        pattern: pattern.to_owned(),
        limit:   MAX_EXPANSIONS,
    }
}
