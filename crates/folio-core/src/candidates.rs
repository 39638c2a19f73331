//! Candidate loading for related-post ranking.
//!
//! A candidate is any other published item sharing at least one topic or
//! hashtag with the source. Loading runs in three steps:
//!
//! 1. Collect the ids of items sharing a topic, then a hashtag, as a set
//!    union (an item found by both queries appears once).
//! 2. Load the published records for those ids.
//! 3. Fetch each candidate's topic and hashtag sets. These lookups are
//!    independent, so they run concurrently and are joined before
//!    returning.
//!
//! Any store failure is logged and returned; no partial candidate list is
//! ever produced.

use anyhow::Result;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use tracing::error;

use crate::models::{Associations, Candidate};
use crate::store::ContentStore;

pub(crate) fn data_access_failure(
    operation: &'static str,
    subject: &str,
    err: anyhow::Error,
) -> anyhow::Error {
    error!(
        operation,
        subject,
        error = %format!("{:#}", err),
        "content store query failed"
    );
    err.context(format!("{} failed for '{}'", operation, subject))
}

/// Load every published item related to `source_id` through a shared topic
/// or hashtag, with its own association sets.
pub async fn load_candidates<S>(
    store: &S,
    source_id: &str,
    source: &Associations,
) -> Result<Vec<Candidate>>
where
    S: ContentStore + ?Sized,
{
    if source.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: BTreeSet<String> = BTreeSet::new();

    if !source.topics.is_empty() {
        let by_topic = store
            .items_sharing_topics(&source.topics, source_id)
            .await
            .map_err(|e| data_access_failure("items_sharing_topics", source_id, e))?;
        ids.extend(by_topic);
    }

    if !source.hashtags.is_empty() {
        let by_hashtag = store
            .items_sharing_hashtags(&source.hashtags, source_id)
            .await
            .map_err(|e| data_access_failure("items_sharing_hashtags", source_id, e))?;
        ids.extend(by_hashtag);
    }

    ids.remove(source_id);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = ids.into_iter().collect();
    let items = store
        .published_items(&ids)
        .await
        .map_err(|e| data_access_failure("published_items", source_id, e))?;

    let candidates = try_join_all(items.into_iter().map(|item| async move {
        let (topics, hashtags) =
            futures::try_join!(store.topic_ids(&item.id), store.hashtag_ids(&item.id))
                .map_err(|e| {
                    let subject = format!("{} (candidate {})", source_id, item.id);
                    data_access_failure("candidate_associations", &subject, e)
                })?;
        Ok::<_, anyhow::Error>(Candidate {
            item,
            associations: Associations { topics, hashtags },
        })
    }))
    .await?;

    Ok(candidates)
}
