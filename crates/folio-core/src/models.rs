//! Core data models shared by the store, the scorer, and the frontends.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::score::ScoreBreakdown;

/// A post as stored by the content workflow.
///
/// Only items with `published == true` take part in related lookups,
/// either as the source or as a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published: bool,
}

/// Topic and hashtag identifier sets attached to one item.
///
/// Identifiers are normalized tag keys (see [`normalize_tag`]). Sets are
/// ordered so that anything derived from them iterates deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Associations {
    pub topics: BTreeSet<String>,
    pub hashtags: BTreeSet<String>,
}

impl Associations {
    /// Build associations from raw tag names, normalizing and dropping
    /// anything that normalizes to an empty key.
    pub fn from_names<T, H>(topics: T, hashtags: H) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        Self {
            topics: topics
                .into_iter()
                .filter_map(|t| normalize_tag(t.as_ref()))
                .collect(),
            hashtags: hashtags
                .into_iter()
                .filter_map(|h| normalize_tag(h.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.hashtags.is_empty()
    }
}

/// A published item loaded as a relatedness candidate, together with its
/// own association sets.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: ContentItem,
    pub associations: Associations,
}

/// One entry of a related-posts response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedResult {
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Always greater than zero; zero-score candidates are never returned.
    pub score: u32,
    /// Scoring breakdown (populated when the query asks for an explanation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreBreakdown>,
}

/// Normalize a topic or hashtag name into its identifier key.
///
/// Trims, strips leading `#`, lowercases, and joins whitespace-separated
/// words with `-`. Returns `None` when nothing is left.
pub fn normalize_tag(name: &str) -> Option<String> {
    let key = name
        .trim()
        .trim_start_matches('#')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Whether `slug` is a well-formed content slug (`[a-z0-9-]+`).
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Rust"), Some("rust".to_string()));
        assert_eq!(normalize_tag("  #Async Rust "), Some("async-rust".to_string()));
        assert_eq!(normalize_tag("##tokio"), Some("tokio".to_string()));
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag("#"), None);
    }

    #[test]
    fn test_associations_from_names_dedups() {
        let a = Associations::from_names(["Rust", "rust", " RUST "], ["#web", ""]);
        assert_eq!(a.topics.len(), 1);
        assert!(a.topics.contains("rust"));
        assert_eq!(a.hashtags.into_iter().collect::<Vec<_>>(), vec!["web"]);
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("a/b"));
    }
}
