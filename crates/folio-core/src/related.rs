//! Related-post ranking.
//!
//! The ranker operates entirely through the [`ContentStore`] trait. The
//! calling application validates the limit and hands in whichever store
//! implementation it uses.
//!
//! # Algorithm
//!
//! 1. Load the source post by slug with its topic and hashtag sets. A
//!    missing or unpublished source yields an empty result.
//! 2. Extract the slugs the source body links to.
//! 3. Load candidates sharing a topic or hashtag (see [`load_candidates`]).
//! 4. Score each candidate (see [`score_candidate`]).
//! 5. Drop zero scores.
//! 6. Sort by score (desc), slug (asc).
//! 7. Truncate to the limit.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::candidates::{data_access_failure, load_candidates};
use crate::links::extract_linked_slugs;
use crate::models::{Associations, RelatedResult};
use crate::score::score_candidate;
use crate::store::ContentStore;

/// Number of related posts returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_LIMIT: usize = 5;

/// Largest limit accepted at the request boundary.
pub const MAX_LIMIT: usize = 20;

/// Parameters for a single related-posts lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedQuery {
    /// Maximum number of results.
    pub limit: usize,
    /// If true, attach a [`ScoreBreakdown`](crate::score::ScoreBreakdown)
    /// to every result.
    pub explain: bool,
}

impl RelatedQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

impl Default for RelatedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            explain: false,
        }
    }
}

/// Rank the published posts related to the post at `slug`.
///
/// Returns an empty list when the slug is unknown or not published.
pub async fn related_items<S>(
    store: &S,
    slug: &str,
    query: &RelatedQuery,
) -> Result<Vec<RelatedResult>>
where
    S: ContentStore + ?Sized,
{
    let source = match store
        .find_by_slug(slug)
        .await
        .map_err(|e| data_access_failure("find_by_slug", slug, e))?
    {
        Some(item) if item.published => item,
        Some(_) => {
            warn!(slug, "related lookup for an unpublished post");
            return Ok(Vec::new());
        }
        None => {
            warn!(slug, "related lookup for an unknown post");
            return Ok(Vec::new());
        }
    };

    let (topics, hashtags) = futures::try_join!(
        store.topic_ids(&source.id),
        store.hashtag_ids(&source.id)
    )
    .map_err(|e| data_access_failure("source_associations", slug, e))?;
    let associations = Associations { topics, hashtags };

    let linked = extract_linked_slugs(&source.body);

    let candidates = load_candidates(store, &source.id, &associations)
        .await
        .with_context(|| format!("loading related candidates for '{}'", slug))?;
    if candidates.is_empty() {
        debug!(slug, "no related candidates");
        return Ok(Vec::new());
    }

    let mut results: Vec<RelatedResult> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let breakdown = score_candidate(&associations, &candidate, &linked);
            let score = breakdown.total();
            if score == 0 {
                return None;
            }
            Some(RelatedResult {
                id: candidate.item.id,
                slug: candidate.item.slug,
                title: candidate.item.title,
                score,
                explain: query.explain.then_some(breakdown),
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.slug.cmp(&b.slug)));
    results.truncate(query.limit);

    debug!(slug, returned = results.len(), "ranked related posts");
    Ok(results)
}

/// Like [`related_items`], but addressed by post id.
///
/// Returns an empty list when the id is unknown or not published.
pub async fn related_items_by_id<S>(
    store: &S,
    id: &str,
    query: &RelatedQuery,
) -> Result<Vec<RelatedResult>>
where
    S: ContentStore + ?Sized,
{
    let item = store
        .find_by_id(id)
        .await
        .map_err(|e| data_access_failure("find_by_id", id, e))?;

    match item {
        Some(item) if item.published => related_items(store, &item.slug, query).await,
        _ => {
            warn!(id, "related lookup for an unknown or unpublished post id");
            Ok(Vec::new())
        }
    }
}
