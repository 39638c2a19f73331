//! Relatedness weights and the candidate scorer.
//!
//! ```text
//! score = 3 × |topics(S) ∩ topics(C)|
//!       + 1 × |hashtags(S) ∩ hashtags(C)|
//!       + 4 × [slug(C) ∈ links(S)]
//! ```
//!
//! Links are directional: only the source's body is consulted, never the
//! candidate's.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::models::{Associations, Candidate};

/// Points contributed by each relation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationWeights {
    /// Per shared topic.
    pub topic: u32,
    /// Per shared hashtag.
    pub hashtag: u32,
    /// Once, if the source body links to the candidate.
    pub link: u32,
    /// Per shared technology. No technology associations exist yet, so
    /// [`score_candidate`] never awards these points.
    pub technology: u32,
}

/// The weight table used by [`score_candidate`].
pub const WEIGHTS: RelationWeights = RelationWeights {
    topic: 3,
    hashtag: 1,
    link: 4,
    technology: 2,
};

/// How a candidate's score was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub shared_topics: u32,
    pub shared_hashtags: u32,
    /// Whether the source body links to the candidate.
    pub linked: bool,
    /// Shared technologies. Always 0 until a technology association exists.
    pub shared_technologies: u32,
    pub topic_points: u32,
    pub hashtag_points: u32,
    pub link_points: u32,
    pub technology_points: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.topic_points + self.hashtag_points + self.link_points + self.technology_points
    }
}

fn shared(a: &BTreeSet<String>, b: &BTreeSet<String>) -> u32 {
    a.intersection(b).count() as u32
}

/// Score one candidate against the source's associations and outgoing links.
pub fn score_candidate(
    source: &Associations,
    candidate: &Candidate,
    linked_slugs: &HashSet<String>,
) -> ScoreBreakdown {
    let shared_topics = shared(&source.topics, &candidate.associations.topics);
    let shared_hashtags = shared(&source.hashtags, &candidate.associations.hashtags);
    let linked = linked_slugs.contains(&candidate.item.slug);

    ScoreBreakdown {
        shared_topics,
        shared_hashtags,
        linked,
        shared_technologies: 0,
        topic_points: shared_topics * WEIGHTS.topic,
        hashtag_points: shared_hashtags * WEIGHTS.hashtag,
        link_points: if linked { WEIGHTS.link } else { 0 },
        technology_points: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentItem;

    fn assoc(topics: &[&str], hashtags: &[&str]) -> Associations {
        Associations::from_names(topics.iter(), hashtags.iter())
    }

    fn candidate(slug: &str, topics: &[&str], hashtags: &[&str]) -> Candidate {
        Candidate {
            item: ContentItem {
                id: format!("id-{}", slug),
                slug: slug.to_string(),
                title: slug.to_string(),
                body: String::new(),
                published: true,
            },
            associations: assoc(topics, hashtags),
        }
    }

    fn links(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_weight_table() {
        assert_eq!(WEIGHTS.topic, 3);
        assert_eq!(WEIGHTS.hashtag, 1);
        assert_eq!(WEIGHTS.link, 4);
        assert_eq!(WEIGHTS.technology, 2);
    }

    #[test]
    fn test_topic_link_scenario() {
        let source = assoc(&["a", "b"], &[]);
        let t = candidate("t", &["a"], &[]);
        let s = score_candidate(&source, &t, &links(&["t"]));
        assert_eq!(s.total(), 7);
        assert_eq!(s.shared_topics, 1);
        assert!(s.linked);
    }

    #[test]
    fn test_hashtag_only() {
        let source = assoc(&["a"], &["x"]);
        let u = candidate("u", &[], &["x"]);
        assert_eq!(score_candidate(&source, &u, &links(&[])).total(), 1);
    }

    #[test]
    fn test_each_shared_topic_adds_three() {
        let source = assoc(&["a", "b", "c"], &[]);
        let one = score_candidate(&source, &candidate("c", &["a"], &[]), &links(&[])).total();
        let two = score_candidate(&source, &candidate("c", &["a", "b"], &[]), &links(&[])).total();
        let three =
            score_candidate(&source, &candidate("c", &["a", "b", "c"], &[]), &links(&[])).total();
        assert_eq!(two - one, 3);
        assert_eq!(three - two, 3);
    }

    #[test]
    fn test_each_shared_hashtag_adds_one() {
        let source = assoc(&[], &["x", "y"]);
        let one = score_candidate(&source, &candidate("c", &[], &["x"]), &links(&[])).total();
        let two = score_candidate(&source, &candidate("c", &[], &["x", "y"]), &links(&[])).total();
        assert_eq!(two - one, 1);
    }

    #[test]
    fn test_link_bonus_applies_once() {
        let source = assoc(&["a"], &[]);
        let c = candidate("target", &["a"], &[]);
        let without = score_candidate(&source, &c, &links(&[])).total();
        let with = score_candidate(&source, &c, &links(&["target", "other"])).total();
        assert_eq!(with - without, 4);
    }

    #[test]
    fn test_unshared_tags_score_zero() {
        let source = assoc(&["a"], &["x"]);
        let c = candidate("c", &["b"], &["y"]);
        assert_eq!(score_candidate(&source, &c, &links(&[])).total(), 0);
    }

    #[test]
    fn test_technology_relation_contributes_nothing() {
        // Technology associations are not wired to any data source yet.
        let source = assoc(&["a"], &["x"]);
        let c = candidate("c", &["a"], &["x"]);
        let s = score_candidate(&source, &c, &links(&["c"]));
        assert_eq!(s.shared_technologies, 0);
        assert_eq!(s.technology_points, 0);
        assert_eq!(s.total(), 3 + 1 + 4);
    }

    #[test]
    fn test_deterministic() {
        let source = assoc(&["a", "b"], &["x", "y"]);
        let c = candidate("c", &["b"], &["x", "y"]);
        let l = links(&["c"]);
        assert_eq!(score_candidate(&source, &c, &l), score_candidate(&source, &c, &l));
    }
}
