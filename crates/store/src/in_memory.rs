//! In-memory store — useful for testing and ephemeral gateways.

use async_trait::async_trait;
use keyrelay_core::channel::{ChannelRecord, Scope};
use keyrelay_core::error::StoreError;
use keyrelay_core::store::{ChannelStore, Projection};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::missing_key_error;

#[derive(Default)]
struct Inner {
    next_id: i64,
    channels: BTreeMap<i64, ChannelRecord>,
}

/// A store that keeps channels in a map keyed by id.
/// Ids are assigned sequentially starting at 1 and never reused.
pub struct InMemoryChannelStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryChannelStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

impl Default for InMemoryChannelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelStore for InMemoryChannelStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list(
        &self,
        offset: usize,
        limit: usize,
        scope: Scope,
    ) -> Result<Vec<ChannelRecord>, StoreError> {
        let inner = self.inner.read().await;
        let newest_first = inner.channels.values().rev();

        let results = match scope {
            Scope::All => newest_first.cloned().collect(),
            Scope::Disabled => newest_first.filter(|c| c.is_disabled()).cloned().collect(),
            Scope::Limited => {
                let take = if limit == 0 { usize::MAX } else { limit };
                newest_first
                    .skip(offset)
                    .take(take)
                    .map(|c| c.clone().redacted())
                    .collect()
            }
        };

        Ok(results)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<ChannelRecord>, StoreError> {
        let inner = self.inner.read().await;
        let id_match = keyword.parse::<i64>().ok();

        Ok(inner
            .channels
            .values()
            .rev()
            .filter(|c| Some(c.id) == id_match || c.name.starts_with(keyword))
            .map(|c| c.clone().redacted())
            .collect())
    }

    async fn get_by_id(&self, id: i64, projection: Projection) -> Result<ChannelRecord, StoreError> {
        let inner = self.inner.read().await;
        let record = inner
            .channels
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        Ok(match projection {
            Projection::Full => record,
            Projection::Redacted => record.redacted(),
        })
    }

    async fn batch_insert(&self, records: Vec<ChannelRecord>) -> Result<Vec<i64>, StoreError> {
        // Validate everything first so a bad record leaves the store untouched
        if let Some(bad) = records.iter().find(|r| r.key.is_empty()) {
            return Err(missing_key_error(bad.id));
        }

        let mut inner = self.inner.write().await;
        let mut ids = Vec::with_capacity(records.len());
        for mut record in records {
            inner.next_id += 1;
            record.id = inner.next_id;
            ids.push(record.id);
            inner.channels.insert(record.id, record);
        }
        Ok(ids)
    }

    async fn update(&self, record: &ChannelRecord) -> Result<(), StoreError> {
        if record.key.is_empty() {
            return Err(missing_key_error(record.id));
        }

        let mut inner = self.inner.write().await;
        let existing = inner
            .channels
            .get_mut(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;

        let created_time = existing.created_time;
        *existing = ChannelRecord {
            created_time,
            ..record.clone()
        };
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .channels
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete_all_disabled(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.channels.len();
        inner.channels.retain(|_, c| !c.is_disabled());
        Ok((before - inner.channels.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrelay_core::channel::ChannelStatus;

    fn channel(name: &str, key: &str, status: ChannelStatus) -> ChannelRecord {
        ChannelRecord {
            channel_type: 1,
            key: key.into(),
            name: name.into(),
            status,
            created_time: 1_700_000_000,
            ..ChannelRecord::default()
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryChannelStore::new();
        let ids = store
            .batch_insert(vec![
                channel("a", "k1", ChannelStatus::Enabled),
                channel("b", "k2", ChannelStatus::Enabled),
            ])
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);

        let fetched = store.get_by_id(2, Projection::Full).await.unwrap();
        assert_eq!(fetched.name, "b");
        assert_eq!(fetched.key, "k2");
    }

    #[tokio::test]
    async fn batch_with_empty_key_inserts_nothing() {
        let store = InMemoryChannelStore::new();
        let result = store
            .batch_insert(vec![
                channel("a", "k1", ChannelStatus::Enabled),
                channel("b", "", ChannelStatus::Enabled),
            ])
            .await;
        assert!(result.is_err());
        assert!(store.list(0, 0, Scope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redacted_fetch_hides_key() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![channel("a", "secret", ChannelStatus::Enabled)])
            .await
            .unwrap();

        let redacted = store.get_by_id(1, Projection::Redacted).await.unwrap();
        assert!(redacted.key.is_empty());
        let full = store.get_by_id(1, Projection::Full).await.unwrap();
        assert_eq!(full.key, "secret");
    }

    #[tokio::test]
    async fn limited_list_paginates_newest_first() {
        let store = InMemoryChannelStore::new();
        let batch = (1..=5)
            .map(|i| channel(&format!("c{i}"), &format!("k{i}"), ChannelStatus::Enabled))
            .collect();
        store.batch_insert(batch).await.unwrap();

        let page = store.list(1, 2, Scope::Limited).await.unwrap();
        let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c4", "c3"]);
        assert!(page.iter().all(|c| c.key.is_empty()));
    }

    #[tokio::test]
    async fn far_past_end_page_is_empty() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![
                channel("a", "k1", ChannelStatus::Enabled),
                channel("b", "k2", ChannelStatus::Enabled),
            ])
            .await
            .unwrap();

        assert!(store.list(usize::MAX, 10, Scope::Limited).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_scope_ignores_pagination_and_keeps_keys() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![
                channel("a", "k1", ChannelStatus::Enabled),
                channel("b", "k2", ChannelStatus::AutoDisabled),
            ])
            .await
            .unwrap();

        let all = store.list(5, 1, Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| !c.key.is_empty()));

        let disabled = store.list(0, 0, Scope::Disabled).await.unwrap();
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].name, "b");
    }

    #[tokio::test]
    async fn search_by_name_prefix_or_id() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![
                channel("openai-main", "k1", ChannelStatus::Enabled),
                channel("anthropic", "k2", ChannelStatus::Enabled),
                channel("openai-backup", "k3", ChannelStatus::Enabled),
            ])
            .await
            .unwrap();

        let by_name = store.search("openai").await.unwrap();
        assert_eq!(by_name.len(), 2);
        assert!(by_name.iter().all(|c| c.key.is_empty()));

        let by_id = store.search("2").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "anthropic");
    }

    #[tokio::test]
    async fn update_preserves_created_time() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![channel("a", "k1", ChannelStatus::Enabled)])
            .await
            .unwrap();

        let mut changed = store.get_by_id(1, Projection::Full).await.unwrap();
        changed.name = "renamed".into();
        changed.created_time = 0;
        store.update(&changed).await.unwrap();

        let stored = store.get_by_id(1, Projection::Full).await.unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.created_time, 1_700_000_000);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryChannelStore::new();
        let mut ghost = channel("ghost", "k", ChannelStatus::Enabled);
        ghost.id = 99;
        assert!(matches!(
            store.update(&ghost).await,
            Err(StoreError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn delete_disabled_counts_removed() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![
                channel("a", "k1", ChannelStatus::Enabled),
                channel("b", "k2", ChannelStatus::ManuallyDisabled),
                channel("c", "k3", ChannelStatus::AutoDisabled),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_all_disabled().await.unwrap(), 2);
        assert_eq!(store.delete_all_disabled().await.unwrap(), 0);
        assert_eq!(store.list(0, 0, Scope::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_id() {
        let store = InMemoryChannelStore::new();
        store
            .batch_insert(vec![channel("a", "k1", ChannelStatus::Enabled)])
            .await
            .unwrap();

        store.delete_by_id(1).await.unwrap();
        assert!(matches!(
            store.delete_by_id(1).await,
            Err(StoreError::NotFound(1))
        ));
    }
}
