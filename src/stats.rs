//! Content database statistics.
//!
//! Provides `folio stats`: post, tag, and association counts.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Row counts for the content tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub posts: i64,
    pub published: i64,
    pub topics: i64,
    pub hashtags: i64,
    pub topic_links: i64,
    pub hashtag_links: i64,
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<ContentStats> {
    Ok(ContentStats {
        posts: count(pool, "SELECT COUNT(*) FROM posts").await?,
        published: count(pool, "SELECT COUNT(*) FROM posts WHERE published = 1").await?,
        topics: count(pool, "SELECT COUNT(*) FROM topics").await?,
        hashtags: count(pool, "SELECT COUNT(*) FROM hashtags").await?,
        topic_links: count(pool, "SELECT COUNT(*) FROM post_topics").await?,
        hashtag_links: count(pool, "SELECT COUNT(*) FROM post_hashtags").await?,
    })
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool).await?;
    pool.close().await;

    println!("Folio content stats");
    println!();
    println!("  Database:   {}", config.db.path.display());
    println!("  Posts:      {} ({} published)", stats.posts, stats.published);
    println!("  Topics:     {} ({} post links)", stats.topics, stats.topic_links);
    println!(
        "  Hashtags:   {} ({} post links)",
        stats.hashtags, stats.hashtag_links
    );

    Ok(())
}
