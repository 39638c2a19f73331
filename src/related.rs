//! `folio related`: print the ranked related posts for a post.
//!
//! Thin CLI wrapper over [`folio_core::related`]. The limit goes through the
//! same validation as the HTTP boundary.

use anyhow::{bail, Result};
use folio_core::models::RelatedResult;
use folio_core::related::{related_items, related_items_by_id, RelatedQuery};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Which post to find related posts for.
#[derive(Debug, Clone)]
pub enum RelatedTarget {
    Slug(String),
    Id(String),
}

/// Parse any UUID spelling (upper case, braced, `urn:uuid:`, simple) into
/// the lowercase hyphenated form posts are stored under.
pub fn canonical_post_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim()).ok().map(|id| id.to_string())
}

/// Core lookup returning structured results (used by the CLI and tests).
pub async fn find_related(
    config: &Config,
    target: &RelatedTarget,
    limit: Option<i64>,
    explain: bool,
) -> Result<Vec<RelatedResult>> {
    let limit = config.related.resolve_limit(limit)?;
    let query = RelatedQuery { limit, explain };

    let target = match target {
        RelatedTarget::Id(id) => match canonical_post_id(id) {
            Some(id) => RelatedTarget::Id(id),
            None => bail!("invalid post id '{}': expected a UUID", id),
        },
        RelatedTarget::Slug(slug) => RelatedTarget::Slug(slug.clone()),
    };

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let results = match &target {
        RelatedTarget::Slug(slug) => related_items(&store, slug, &query).await,
        RelatedTarget::Id(id) => related_items_by_id(&store, id, &query).await,
    };

    store.pool().close().await;
    results
}

/// CLI entry point: look up and print.
pub async fn run_related(
    config: &Config,
    target: RelatedTarget,
    limit: Option<i64>,
    explain: bool,
    json: bool,
) -> Result<()> {
    let results = find_related(config, &target, limit, explain).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No related posts.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{}] {} ({})",
            i + 1,
            result.score,
            result.title,
            result.slug
        );
        println!("    id: {}", result.id);
        if let Some(ref b) = result.explain {
            println!(
                "    topics: {} (+{})  hashtags: {} (+{})  linked: {} (+{})",
                b.shared_topics,
                b.topic_points,
                b.shared_hashtags,
                b.hashtag_points,
                if b.linked { "yes" } else { "no" },
                b.link_points
            );
        }
    }

    Ok(())
}
