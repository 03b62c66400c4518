//! Ordered include/exclude filtering over item lists.
//!
//! Patterns are applied in order against the *whole* item list. Include
//! patterns add their matches to a [`DecisionSet`], exclude patterns remove
//! theirs, and the surviving paths are projected back over the input so the
//! result keeps the original order.

use crate::brace::expand_braces;
use crate::error::Result;
use crate::glob::Pattern;
use crate::options::MatchOptions;
use std::collections::HashSet;
use tracing::debug;

/// Anything that can be filtered by its relative `/`-separated path.
pub trait PathKey {
    fn path_key(&self) -> &str;
}

impl PathKey for str {
    fn path_key(&self) -> &str { self }
}

impl PathKey for String {
    fn path_key(&self) -> &str { self }
}

impl<T: PathKey + ?Sized> PathKey for &T {
    fn path_key(&self) -> &str { (**self).path_key() }
}

/// Whether a pattern adds to or subtracts from the kept set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

impl Polarity {
    /// Leading `!` count decides polarity: odd runs exclude, even runs
    /// re-include. `flip_negate` swaps the parity.
    fn from_negations(count: usize, flip_negate: bool) -> Self {
        if count == 0 || (count % 2 == 0) != flip_negate {
            Self::Include
        } else {
            Self::Exclude
        }
    }
}

/// Set of kept paths while a filter pass runs.
#[derive(Debug, Default, Clone)]
pub struct DecisionSet<'a> {
    kept: HashSet<&'a str>,
}

impl<'a> DecisionSet<'a> {
    pub fn new() -> Self { Self::default() }

    /// Union a path into the kept set.
    pub fn include(&mut self, path: &'a str) { self.kept.insert(path); }

    /// Subtract a path, whether or not it was kept before.
    pub fn exclude(&mut self, path: &str) { self.kept.remove(path); }

    pub fn is_kept(&self, path: &str) -> bool { self.kept.contains(path) }

    pub fn len(&self) -> usize { self.kept.len() }

    pub fn is_empty(&self) -> bool { self.kept.is_empty() }

    /// Keep the items whose key is in the set, in their original order.
    pub fn project<T, K>(&self, items: &'a [T], key: K) -> Vec<&'a T>
    where
        K: Fn(&'a T) -> &'a str,
    {
        items.iter().filter(|item| self.is_kept(key(*item))).collect()
    }
}

/// One non-empty, non-comment pattern line after negation and brace
/// expansion.
#[derive(Debug, Clone)]
pub struct FilterRule {
    pattern:  String,
    polarity: Polarity,
    matchers: Vec<Pattern>,
}

impl FilterRule {
    /// Pattern text with negations stripped.
    pub fn pattern(&self) -> &str { &self.pattern }

    pub fn polarity(&self) -> Polarity { self.polarity }

    pub fn matchers(&self) -> &[Pattern] { &self.matchers }
}

/// Compiled, reusable pattern list.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    rules: Vec<FilterRule>,
}

impl PatternFilter {
    pub fn new<I, S>(patterns: I, options: MatchOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Expanded sub-patterns are plain globs: no comments, no negation,
        // no second round of brace expansion.
        let sub_options = options.no_comment(true).no_negate(true).no_brace(true);
        let mut rules = Vec::new();

        for raw in patterns {
            let raw = raw.as_ref();
            debug!(pattern = raw, "processing filter pattern");

            let mut pattern = raw.trim();
            if pattern.is_empty() {
                debug!("skipping empty pattern");
                continue;
            }

            if !options.no_comment && pattern.starts_with('#') {
                debug!(pattern, "skipping comment");
                continue;
            }

            let mut negations = 0;
            if !options.no_negate {
                negations = pattern.chars().take_while(|c| *c == '!').count();
                if negations > 0 {
                    debug!(negations, "trimming leading '!'");
                    pattern = &pattern[negations..];
                }
            }
            let polarity = Polarity::from_negations(negations, options.flip_negate);

            let pattern = pattern.trim();
            if pattern.is_empty() {
                debug!("skipping pattern that is empty after negation");
                continue;
            }

            let expanded = if options.no_brace {
                vec![pattern.to_owned()]
            } else {
                let expanded = expand_braces(&pattern.replace('\\', "/"))?;
                debug!(pattern, count = expanded.len(), "expanded braces");
                expanded
            };

            let mut matchers = Vec::with_capacity(expanded.len());
            for sub in &expanded {
                let sub = sub.trim();
                if sub.is_empty() {
                    debug!("skipping empty expansion");
                    continue;
                }
                matchers.push(Pattern::compile(sub, sub_options)?);
            }

            rules.push(FilterRule {
                pattern: pattern.to_owned(),
                polarity,
                matchers,
            });
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[FilterRule] { &self.rules }

    /// Filter items that expose their own path.
    pub fn apply<'a, T: PathKey>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.apply_by(items, |item: &'a T| item.path_key())
    }

    /// Filter items through an explicit key extractor.
    pub fn apply_by<'a, T, K>(&self, items: &'a [T], key: K) -> Vec<&'a T>
    where
        K: Fn(&'a T) -> &'a str,
    {
        let decisions = self.decide(items, &key);
        let kept = decisions.project(items, &key);
        debug!(total = items.len(), kept = kept.len(), "filter applied");
        kept
    }

    /// Run every rule over `items` and return the resulting decision set.
    pub fn decide<'a, T, K>(&self, items: &'a [T], key: K) -> DecisionSet<'a>
    where
        K: Fn(&'a T) -> &'a str,
    {
        let mut decisions = DecisionSet::new();

        for rule in &self.rules {
            for matcher in &rule.matchers {
                let mut hits = 0usize;
                for item in items {
                    let path = key(item);
                    if !matcher.matches(path) {
                        continue;
                    }
                    hits += 1;
                    match rule.polarity {
                        Polarity::Include => decisions.include(path),
                        Polarity::Exclude => decisions.exclude(path),
                    }
                }
                debug!(
                    pattern = matcher.source(),
                    polarity = ?rule.polarity,
                    hits,
                    "applied pattern"
                );
            }
        }

        decisions
    }
}

/// Compile `patterns` and filter `items` in one step.
pub fn filter<'a, T, I, S>(items: &'a [T], patterns: I, options: MatchOptions) -> Result<Vec<&'a T>>
where
    T: PathKey,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(PatternFilter::new(patterns, options)?.apply(items))
}
