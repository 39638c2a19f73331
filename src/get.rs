//! Post retrieval by slug.
//!
//! Used by the `folio get` CLI command to inspect what the related-post
//! ranker sees for a post: its tags and the slugs its body links to.

use anyhow::{bail, Result};
use serde::Serialize;

use folio_core::links::extract_linked_slugs;
use folio_core::store::ContentStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub published: bool,
    pub topics: Vec<String>,
    pub hashtags: Vec<String>,
    /// Slugs linked from the body, sorted.
    pub links: Vec<String>,
    pub body: String,
}

/// Load a post with its associations and outgoing links.
pub async fn get_post<S>(store: &S, slug: &str) -> Result<PostResponse>
where
    S: ContentStore + ?Sized,
{
    let item = match store.find_by_slug(slug).await? {
        Some(item) => item,
        None => bail!("post not found: {}", slug),
    };

    let topics = store.topic_ids(&item.id).await?;
    let hashtags = store.hashtag_ids(&item.id).await?;
    let mut links: Vec<String> = extract_linked_slugs(&item.body).into_iter().collect();
    links.sort();

    Ok(PostResponse {
        id: item.id,
        slug: item.slug,
        title: item.title,
        published: item.published,
        topics: topics.into_iter().collect(),
        hashtags: hashtags.into_iter().collect(),
        links,
        body: item.body,
    })
}

/// CLI entry point: prints the post to stdout, as text or JSON.
pub async fn run_get(config: &Config, slug: &str, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let post = get_post(&store, slug).await;
    store.pool().close().await;
    let post = post?;

    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }

    println!("--- Post ---");
    println!("id:        {}", post.id);
    println!("slug:      {}", post.slug);
    println!("title:     {}", post.title);
    println!("published: {}", post.published);
    println!("topics:    {}", post.topics.join(", "));
    println!("hashtags:  {}", post.hashtags.join(", "));
    println!("links:     {}", post.links.join(", "));
    println!();

    println!("--- Body ---");
    println!("{}", post.body);

    Ok(())
}
