//! How log events find their song and artist in the catalog.
//!
//! The log feed and the catalog share no identifier, so events are matched
//! by name. A matcher turns a name into a join key; two names match when
//! their keys are equal.

use clap::ValueEnum;
use std::fmt::Debug;
use std::sync::Arc;

pub trait NameMatcher: Send + Sync + Debug {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Join key for `name`. `None` never matches anything.
    fn join_key(&self, name: &str) -> Option<String>;
}

/// Byte-for-byte equality. Case, whitespace and punctuation differences
/// are misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatcher;

impl NameMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn join_key(&self, name: &str) -> Option<String> {
        Some(name.to_owned())
    }
}

/// Equality after trimming, collapsing inner whitespace and lowercasing.
/// Blank names never match.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedMatcher;

impl NameMatcher for NormalizedMatcher {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn join_key(&self, name: &str) -> Option<String> {
        let key = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MatcherKind {
    #[default]
    Exact,
    Normalized,
}

impl MatcherKind {
    pub fn build(self) -> Arc<dyn NameMatcher> {
        match self {
            MatcherKind::Exact => Arc::new(ExactMatcher),
            MatcherKind::Normalized => Arc::new(NormalizedMatcher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_keeps_names_verbatim() {
        let matcher = ExactMatcher;
        assert_eq!(matcher.join_key("Test Song"), Some("Test Song".to_owned()));
        assert_ne!(matcher.join_key("Test Song"), matcher.join_key("test song"));
        assert_ne!(matcher.join_key("Test Song"), matcher.join_key("Test Song "));
        assert_eq!(matcher.join_key(""), Some(String::new()));
    }

    #[test]
    fn normalized_folds_case_and_whitespace() {
        let matcher = NormalizedMatcher;
        assert_eq!(
            matcher.join_key("  The   Black Keys "),
            matcher.join_key("the black keys")
        );
        assert_eq!(matcher.join_key("   "), None);
    }

    #[test]
    fn kind_builds_matching_matcher() {
        assert_eq!(MatcherKind::Exact.build().name(), "exact");
        assert_eq!(MatcherKind::Normalized.build().name(), "normalized");
        assert_eq!(MatcherKind::from_str("NORMALIZED", true), Ok(MatcherKind::Normalized));
    }
}
