//! SQLite-backed [`ContentStore`] implementation.
//!
//! Maps each store operation onto the schema created by
//! [`migrate`](crate::migrate). `IN (...)` lists are built with
//! [`QueryBuilder`] so every value stays a bound parameter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::BTreeSet;

use folio_core::models::{Associations, ContentItem};
use folio_core::store::ContentStore;

/// SQLite implementation of the [`ContentStore`] trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Content hash recorded by the last import of `slug`, if any.
    pub async fn content_hash(&self, slug: &str) -> Result<Option<String>> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT content_hash FROM posts WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hash.flatten())
    }

    pub async fn set_content_hash(&self, id: &str, hash: &str) -> Result<()> {
        sqlx::query("UPDATE posts SET content_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn tag_ids(&self, link_table: &str, tag_column: &str, item_id: &str) -> Result<BTreeSet<String>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE post_id = ?",
            tag_column, link_table
        );
        let ids: Vec<String> = sqlx::query_scalar(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("reading {} for post {}", link_table, item_id))?;
        Ok(ids.into_iter().collect())
    }

    async fn items_sharing(
        &self,
        link_table: &str,
        tag_column: &str,
        tag_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT DISTINCT post_id FROM {} WHERE post_id != ",
            link_table
        ));
        qb.push_bind(exclude_id);
        qb.push(format!(" AND {} IN (", tag_column));
        let mut separated = qb.separated(", ");
        for id in tag_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY post_id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("querying {} for shared tags", link_table))?;
        Ok(rows.iter().map(|r| r.get("post_id")).collect())
    }

    async fn replace_tags(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        tag_table: &str,
        link_table: &str,
        tag_column: &str,
        post_id: &str,
        tags: &BTreeSet<String>,
    ) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE post_id = ?", link_table))
            .bind(post_id)
            .execute(&mut **tx)
            .await?;

        for tag in tags {
            sqlx::query(&format!(
                "INSERT INTO {} (id) VALUES (?) ON CONFLICT(id) DO NOTHING",
                tag_table
            ))
            .bind(tag)
            .execute(&mut **tx)
            .await?;

            sqlx::query(&format!(
                "INSERT INTO {} (post_id, {}) VALUES (?, ?)",
                link_table, tag_column
            ))
            .bind(post_id)
            .bind(tag)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn item_from_row(row: &SqliteRow) -> ContentItem {
    ContentItem {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        published: row.get("published"),
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query("SELECT id, slug, title, body, published FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query("SELECT id, slug, title, body, published FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn topic_ids(&self, item_id: &str) -> Result<BTreeSet<String>> {
        self.tag_ids("post_topics", "topic_id", item_id).await
    }

    async fn hashtag_ids(&self, item_id: &str) -> Result<BTreeSet<String>> {
        self.tag_ids("post_hashtags", "hashtag_id", item_id).await
    }

    async fn items_sharing_topics(
        &self,
        topic_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>> {
        self.items_sharing("post_topics", "topic_id", topic_ids, exclude_id)
            .await
    }

    async fn items_sharing_hashtags(
        &self,
        hashtag_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>> {
        self.items_sharing("post_hashtags", "hashtag_id", hashtag_ids, exclude_id)
            .await
    }

    async fn published_items(&self, ids: &[String]) -> Result<Vec<ContentItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, slug, title, body, published FROM posts WHERE published = 1 AND id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY slug");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("loading published candidate posts")?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn upsert_item(
        &self,
        item: &ContentItem,
        associations: &Associations,
    ) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        // An existing slug keeps its id; otherwise the item's id is used,
        // which renames the post when that id is already stored.
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM posts WHERE slug = ?")
            .bind(&item.slug)
            .fetch_optional(&mut *tx)
            .await?;
        let id = existing.unwrap_or_else(|| item.id.clone());

        sqlx::query(
            r#"
            INSERT INTO posts (id, slug, title, body, published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                slug = excluded.slug,
                title = excluded.title,
                body = excluded.body,
                published = excluded.published,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&item.slug)
        .bind(&item.title)
        .bind(&item.body)
        .bind(item.published)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("upserting post '{}'", item.slug))?;

        Self::replace_tags(
            &mut tx,
            "topics",
            "post_topics",
            "topic_id",
            &id,
            &associations.topics,
        )
        .await?;
        Self::replace_tags(
            &mut tx,
            "hashtags",
            "post_hashtags",
            "hashtag_id",
            &id,
            &associations.hashtags,
        )
        .await?;

        tx.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::related::{related_items, RelatedQuery};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::migrate::migrate_pool(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn post(id: &str, slug: &str, body: &str, published: bool) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            body: body.to_string(),
            published,
        }
    }

    #[tokio::test]
    async fn test_upsert_roundtrip_and_replace_tags() {
        let store = memory_store().await;
        let id = store
            .upsert_item(
                &post("p1", "first", "", true),
                &Associations::from_names(["Rust", "Web"], ["#tokio"]),
            )
            .await
            .unwrap();
        assert_eq!(id, "p1");
        assert_eq!(
            store.topic_ids("p1").await.unwrap().into_iter().collect::<Vec<_>>(),
            vec!["rust", "web"]
        );

        // Same slug, new id and tags: id is kept, tags are replaced.
        let id = store
            .upsert_item(
                &post("other", "first", "edited", false),
                &Associations::from_names(["go"], Vec::<&str>::new()),
            )
            .await
            .unwrap();
        assert_eq!(id, "p1");
        let item = store.find_by_id("p1").await.unwrap().unwrap();
        assert_eq!(item.body, "edited");
        assert!(!item.published);
        assert_eq!(
            store.topic_ids("p1").await.unwrap().into_iter().collect::<Vec<_>>(),
            vec!["go"]
        );
        assert!(store.hashtag_ids("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_known_id_renames() {
        let store = memory_store().await;
        store
            .upsert_item(&post("p1", "old-slug", "", true), &Associations::default())
            .await
            .unwrap();
        let id = store
            .upsert_item(&post("p1", "new-slug", "", true), &Associations::default())
            .await
            .unwrap();
        assert_eq!(id, "p1");
        assert!(store.find_by_slug("old-slug").await.unwrap().is_none());
        assert_eq!(
            store.find_by_slug("new-slug").await.unwrap().unwrap().id,
            "p1"
        );
    }

    #[tokio::test]
    async fn test_sharing_queries_exclude_source() {
        let store = memory_store().await;
        let tags = Associations::from_names(["rust"], ["async"]);
        store.upsert_item(&post("a", "a", "", true), &tags).await.unwrap();
        store.upsert_item(&post("b", "b", "", true), &tags).await.unwrap();
        store.upsert_item(&post("c", "c", "", false), &tags).await.unwrap();

        let ids = store.items_sharing_topics(&tags.topics, "a").await.unwrap();
        assert_eq!(ids, vec!["b", "c"]);
        let ids = store.items_sharing_hashtags(&tags.hashtags, "a").await.unwrap();
        assert_eq!(ids, vec!["b", "c"]);

        let items = store.published_items(&ids).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "b");
    }

    #[tokio::test]
    async fn test_related_ranking_over_sqlite() {
        let store = memory_store().await;
        store
            .upsert_item(
                &post("s", "s", r#"<a href="/blog/t">t</a>"#, true),
                &Associations::from_names(["a", "b"], ["h"]),
            )
            .await
            .unwrap();
        store
            .upsert_item(
                &post("t", "t", "", true),
                &Associations::from_names(["a"], Vec::<&str>::new()),
            )
            .await
            .unwrap();
        store
            .upsert_item(
                &post("u", "u", "", true),
                &Associations::from_names(Vec::<&str>::new(), ["h"]),
            )
            .await
            .unwrap();

        let results = related_items(&store, "s", &RelatedQuery::default())
            .await
            .unwrap();
        let ranked: Vec<(&str, u32)> = results.iter().map(|r| (r.slug.as_str(), r.score)).collect();
        assert_eq!(ranked, vec![("t", 7), ("u", 1)]);
    }

    #[tokio::test]
    async fn test_content_hash() {
        let store = memory_store().await;
        let id = store
            .upsert_item(&post("h", "hashed", "", true), &Associations::default())
            .await
            .unwrap();
        assert_eq!(store.content_hash("hashed").await.unwrap(), None);
        store.set_content_hash(&id, "abc").await.unwrap();
        assert_eq!(store.content_hash("hashed").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(store.content_hash("missing").await.unwrap(), None);
    }
}
