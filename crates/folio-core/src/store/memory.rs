//! In-memory [`ContentStore`] implementation for tests and embedding.
//!
//! Uses `BTreeMap`s behind `std::sync::RwLock`, so every listing comes
//! back in a stable order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Associations, ContentItem};

use super::ContentStore;

#[derive(Default)]
struct Inner {
    items: BTreeMap<String, ContentItem>,
    slugs: BTreeMap<String, String>,
    associations: BTreeMap<String, Associations>,
}

/// In-memory store for tests and embedding.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sharing<F>(inner: &Inner, exclude_id: &str, pick: F) -> Vec<String>
where
    F: Fn(&Associations) -> bool,
{
    inner
        .associations
        .iter()
        .filter(|(id, a)| id.as_str() != exclude_id && pick(a))
        .map(|(id, _)| id.clone())
        .collect()
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ContentItem>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .slugs
            .get(slug)
            .and_then(|id| inner.items.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>> {
        Ok(self.inner.read().unwrap().items.get(id).cloned())
    }

    async fn topic_ids(&self, item_id: &str) -> Result<BTreeSet<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .associations
            .get(item_id)
            .map(|a| a.topics.clone())
            .unwrap_or_default())
    }

    async fn hashtag_ids(&self, item_id: &str) -> Result<BTreeSet<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .associations
            .get(item_id)
            .map(|a| a.hashtags.clone())
            .unwrap_or_default())
    }

    async fn items_sharing_topics(
        &self,
        topic_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(sharing(&inner, exclude_id, |a| {
            !a.topics.is_disjoint(topic_ids)
        }))
    }

    async fn items_sharing_hashtags(
        &self,
        hashtag_ids: &BTreeSet<String>,
        exclude_id: &str,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(sharing(&inner, exclude_id, |a| {
            !a.hashtags.is_disjoint(hashtag_ids)
        }))
    }

    async fn published_items(&self, ids: &[String]) -> Result<Vec<ContentItem>> {
        let inner = self.inner.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.items.get(id))
            .filter(|item| item.published)
            .cloned()
            .collect())
    }

    async fn upsert_item(
        &self,
        item: &ContentItem,
        associations: &Associations,
    ) -> Result<String> {
        let mut inner = self.inner.write().unwrap();
        let id = inner
            .slugs
            .get(&item.slug)
            .cloned()
            .unwrap_or_else(|| item.id.clone());

        // Renamed post: drop the stale slug index entry.
        let stale_slug = inner
            .items
            .get(&id)
            .filter(|prev| prev.slug != item.slug)
            .map(|prev| prev.slug.clone());
        if let Some(old) = stale_slug {
            inner.slugs.remove(&old);
        }

        let mut stored = item.clone();
        stored.id = id.clone();
        inner.slugs.insert(stored.slug.clone(), id.clone());
        inner.items.insert(id.clone(), stored);
        inner.associations.insert(id.clone(), associations.clone());
        Ok(id)
    }
}
