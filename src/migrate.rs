//! Database schema migrations.
//!
//! Every statement is idempotent, so `folio init` can run repeatedly.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `posts` | Post records keyed by UUID, unique by slug |
//! | `topics` / `hashtags` | Normalized tag keys |
//! | `post_topics` / `post_hashtags` | Many-to-many association rows |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an already open pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            content_hash TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    for table in ["topics", "hashtags"] {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY)",
            table
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_topics (
            post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            topic_id TEXT NOT NULL REFERENCES topics(id),
            PRIMARY KEY (post_id, topic_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_hashtags (
            post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            hashtag_id TEXT NOT NULL REFERENCES hashtags(id),
            PRIMARY KEY (post_id, hashtag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_topics_topic ON post_topics(topic_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_hashtags_hashtag ON post_hashtags(hashtag_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_published ON posts(published)")
        .execute(pool)
        .await?;

    Ok(())
}
