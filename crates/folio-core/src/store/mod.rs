//! Storage abstraction for Folio.
//!
//! The [`ContentStore`] trait defines every storage operation the related
//! posts pipeline and the importer need, so the same code runs against
//! SQLite in the application and [`memory::InMemoryStore`] in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::models::{Associations, ContentItem};

/// Abstract storage backend for posts and their tag associations.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_by_slug`](ContentStore::find_by_slug) | Item by slug, any status |
/// | [`find_by_id`](ContentStore::find_by_id) | Item by id, any status |
/// | [`topic_ids`](ContentStore::topic_ids) | An item's topic keys |
/// | [`hashtag_ids`](ContentStore::hashtag_ids) | An item's hashtag keys |
/// | [`items_sharing_topics`](ContentStore::items_sharing_topics) | Ids of items tagged with any of the topics |
/// | [`items_sharing_hashtags`](ContentStore::items_sharing_hashtags) | Ids of items tagged with any of the hashtags |
/// | [`published_items`](ContentStore::published_items) | Published records for a set of ids |
/// | [`upsert_item`](ContentStore::upsert_item) | Write an item and replace its associations |
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up an item by slug regardless of publication status.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ContentItem>>;

    /// Look up an item by id regardless of publication status.
    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>>;

    async fn topic_ids(&self, item_id: &str) -> Result<BTreeSet<String>>;

    async fn hashtag_ids(&self, item_id: &str) -> Result<BTreeSet<String>>;

    /// Distinct ids of items other than `exclude_id` carrying at least one
    /// of `topic_ids`. Publication status is not checked here.
    async fn items_sharing_topics(
        &self,
        topic_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>>;

    /// Distinct ids of items other than `exclude_id` carrying at least one
    /// of `hashtag_ids`. Publication status is not checked here.
    async fn items_sharing_hashtags(
        &self,
        hashtag_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>>;

    /// Load the published items among `ids`. Unknown and unpublished ids
    /// are skipped.
    async fn published_items(&self, ids: &[String]) -> Result<Vec<ContentItem>>;

    /// Insert or update an item keyed by slug and replace its topic and
    /// hashtag associations.
    ///
    /// Returns the stored id, which is the existing id when the slug was
    /// already present.
    async fn upsert_item(&self, item: &ContentItem, associations: &Associations)
        -> Result<String>;
}
