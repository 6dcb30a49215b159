//! Bulk import. Reconciles a list of transferred channels against the store.
//!
//! Each item is handled on its own:
//! - positive `id`: merge into the stored channel (non-empty fields win)
//! - no `id`, a key and a positive type: create a new channel
//! - anything else: skipped
//!
//! An item whose status code is not a known `ChannelStatus` is skipped too.
//!
//! A failing item is logged and left out of the counts; it never aborts the
//! rest of the batch.

use futures::stream::{self, StreamExt};
use keyrelay_core::channel::{ChannelRecord, ChannelStatus, key_fingerprint};
use keyrelay_core::error::Result;
use keyrelay_core::store::{ChannelStore, Projection};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One channel as received by the import endpoint.
///
/// Same fields as a `ChannelRecord` minus `created_time`. Every field is
/// optional on the wire; `id == 0` means "create".
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub channel_type: i32,
    pub key: String,
    pub name: String,
    /// Raw status code; validated per item so one bad code can't fail the batch
    pub status: i32,
    pub weight: Option<u32>,
    pub base_url: Option<String>,
    pub models: String,
    pub group: String,
    pub model_mapping: Option<String>,
    pub priority: Option<i64>,
    pub config: String,
    pub system_prompt: Option<String>,
}

impl std::fmt::Debug for ImportItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportItem")
            .field("id", &self.id)
            .field("channel_type", &self.channel_type)
            .field("key", &key_fingerprint(&self.key))
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// What the reconciler decided to do with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Merge(i64),
    Create,
    Skip,
}

impl ImportItem {
    pub fn action(&self) -> ImportAction {
        if self.channel_status().is_none() {
            ImportAction::Skip
        } else if self.id > 0 {
            ImportAction::Merge(self.id)
        } else if !self.key.is_empty() && self.channel_type > 0 {
            ImportAction::Create
        } else {
            ImportAction::Skip
        }
    }

    /// The imported status, or `None` when the code is out of range.
    pub fn channel_status(&self) -> Option<ChannelStatus> {
        ChannelStatus::try_from(self.status).ok()
    }

    /// Build a new, unsaved channel. An unset or unknown status becomes
    /// `Enabled`.
    pub fn into_new_record(self, created_time: i64) -> ChannelRecord {
        let status = match self.channel_status() {
            None | Some(ChannelStatus::Unknown) => ChannelStatus::Enabled,
            Some(other) => other,
        };

        ChannelRecord {
            id: 0,
            channel_type: self.channel_type,
            key: self.key,
            name: self.name,
            status,
            weight: self.weight,
            base_url: self.base_url,
            models: self.models,
            group: self.group,
            model_mapping: self.model_mapping,
            priority: self.priority,
            config: self.config,
            system_prompt: self.system_prompt,
            created_time,
        }
    }

    /// Overwrite the fields of `existing` that this item actually carries.
    ///
    /// Empty strings and `None` leave the stored value alone, so an empty key
    /// never wipes a credential. Status only moves when the imported code is
    /// positive: an imported 0 cannot clear a stored status. Neither `id` nor
    /// `created_time` is touched.
    pub fn merge_into(self, existing: &mut ChannelRecord) {
        fn take_string(target: &mut String, incoming: String) {
            if !incoming.is_empty() {
                *target = incoming;
            }
        }
        fn take_option<T>(target: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *target = incoming;
            }
        }

        if self.status > 0
            && let Some(status) = self.channel_status()
        {
            existing.status = status;
        }
        take_string(&mut existing.name, self.name);
        take_option(&mut existing.weight, self.weight);
        take_option(&mut existing.base_url, self.base_url);
        take_string(&mut existing.models, self.models);
        take_string(&mut existing.group, self.group);
        take_option(&mut existing.model_mapping, self.model_mapping);
        take_option(&mut existing.priority, self.priority);
        take_string(&mut existing.config, self.config);
        take_option(&mut existing.system_prompt, self.system_prompt);
        take_string(&mut existing.key, self.key);
    }
}

/// Counts returned by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Skipped,
}

/// Reconcile every item against the store and count what changed.
///
/// Never fails as a whole. The fetch and the update of a merge are separate
/// store calls, so a concurrent writer can slip in between them.
pub async fn import(
    store: &dyn ChannelStore,
    items: Vec<ImportItem>,
    created_time: i64,
) -> ImportSummary {
    stream::iter(items.into_iter().enumerate())
        .fold(ImportSummary::default(), move |mut summary, (index, item)| async move {
            match apply(store, item, created_time).await {
                Ok(Outcome::Created) => summary.created += 1,
                Ok(Outcome::Updated) => summary.updated += 1,
                Ok(Outcome::Skipped) => debug!(index, "Import item skipped"),
                Err(e) => warn!(index, error = %e, "Import item failed, skipping"),
            }
            summary
        })
        .await
}

async fn apply(store: &dyn ChannelStore, item: ImportItem, created_time: i64) -> Result<Outcome> {
    match item.action() {
        ImportAction::Merge(id) => {
            let mut existing = store.get_by_id(id, Projection::Full).await?;
            item.merge_into(&mut existing);
            store.update(&existing).await?;
            debug!(id, "Merged imported channel");
            Ok(Outcome::Updated)
        }
        ImportAction::Create => {
            let record = item.into_new_record(created_time);
            let key = key_fingerprint(&record.key);
            let ids = store.batch_insert(vec![record]).await?;
            debug!(id = ?ids.first(), key = %key, "Created imported channel");
            Ok(Outcome::Created)
        }
        ImportAction::Skip => Ok(Outcome::Skipped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keyrelay_core::channel::Scope;
    use keyrelay_core::error::StoreError;
    use keyrelay_store::InMemoryChannelStore;

    fn stored(name: &str, key: &str) -> ChannelRecord {
        ChannelRecord {
            channel_type: 1,
            key: key.into(),
            name: name.into(),
            status: ChannelStatus::Enabled,
            weight: Some(1),
            base_url: Some("https://old.example.com".into()),
            models: "gpt-4o".into(),
            group: "default".into(),
            priority: Some(0),
            config: "{}".into(),
            created_time: 1_600_000_000,
            ..ChannelRecord::default()
        }
    }

    async fn seeded(records: Vec<ChannelRecord>) -> InMemoryChannelStore {
        let store = InMemoryChannelStore::new();
        store.batch_insert(records).await.unwrap();
        store
    }

    #[test]
    fn action_selection() {
        let merge = ImportItem { id: 5, ..ImportItem::default() };
        assert_eq!(merge.action(), ImportAction::Merge(5));

        let create = ImportItem {
            channel_type: 1,
            key: "k".into(),
            ..ImportItem::default()
        };
        assert_eq!(create.action(), ImportAction::Create);

        let no_type = ImportItem { key: "k".into(), ..ImportItem::default() };
        assert_eq!(no_type.action(), ImportAction::Skip);

        let no_key = ImportItem { channel_type: 1, ..ImportItem::default() };
        assert_eq!(no_key.action(), ImportAction::Skip);

        let bad_status = ImportItem {
            id: 5,
            status: 4,
            ..ImportItem::default()
        };
        assert_eq!(bad_status.action(), ImportAction::Skip);
    }

    #[test]
    fn merge_keeps_fields_the_item_leaves_empty() {
        let mut existing = stored("orig", "sk-stored");
        existing.id = 3;
        let item = ImportItem {
            id: 3,
            name: "Renamed".into(),
            weight: Some(9),
            ..ImportItem::default()
        };

        item.merge_into(&mut existing);

        assert_eq!(existing.id, 3);
        assert_eq!(existing.name, "Renamed");
        assert_eq!(existing.weight, Some(9));
        assert_eq!(existing.key, "sk-stored");
        assert_eq!(existing.base_url.as_deref(), Some("https://old.example.com"));
        assert_eq!(existing.models, "gpt-4o");
        assert_eq!(existing.status, ChannelStatus::Enabled);
        assert_eq!(existing.created_time, 1_600_000_000);
    }

    #[test]
    fn merge_overwrites_with_present_values() {
        let mut existing = stored("orig", "sk-stored");
        let item = ImportItem {
            key: "sk-new".into(),
            status: ChannelStatus::ManuallyDisabled.code(),
            base_url: Some(String::new()),
            priority: Some(-1),
            system_prompt: Some("terse".into()),
            ..ImportItem::default()
        };

        item.merge_into(&mut existing);

        assert_eq!(existing.key, "sk-new");
        assert_eq!(existing.status, ChannelStatus::ManuallyDisabled);
        assert_eq!(existing.base_url.as_deref(), Some(""));
        assert_eq!(existing.priority, Some(-1));
        assert_eq!(existing.system_prompt.as_deref(), Some("terse"));
    }

    #[test]
    fn zero_status_never_clears_enabled() {
        let mut existing = stored("orig", "k");
        ImportItem::default().merge_into(&mut existing);
        assert_eq!(existing.status, ChannelStatus::Enabled);
    }

    #[test]
    fn new_record_defaults_status_to_enabled() {
        let item = ImportItem {
            channel_type: 2,
            key: "k".into(),
            ..ImportItem::default()
        };
        let record = item.into_new_record(1_700_000_000);
        assert_eq!(record.status, ChannelStatus::Enabled);
        assert_eq!(record.created_time, 1_700_000_000);
        assert_eq!(record.id, 0);

        let disabled = ImportItem {
            channel_type: 2,
            key: "k".into(),
            status: ChannelStatus::AutoDisabled.code(),
            ..ImportItem::default()
        };
        assert_eq!(
            disabled.into_new_record(0).status,
            ChannelStatus::AutoDisabled
        );
    }

    #[tokio::test]
    async fn create_and_merge_in_one_batch() {
        let store = seeded(vec![
            stored("one", "k1"),
            stored("two", "k2"),
            stored("three", "k3"),
            stored("four", "k4"),
            stored("five", "k5"),
        ])
        .await;

        let items: Vec<ImportItem> = serde_json::from_str(
            r#"[{"id": 0, "type": 1, "key": "x", "name": "N"}, {"id": 5, "name": "Renamed"}]"#,
        )
        .unwrap();

        let summary = import(&store, items, 1_700_000_000).await;
        assert_eq!(summary, ImportSummary { created: 1, updated: 1 });

        let renamed = store.get_by_id(5, Projection::Full).await.unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.key, "k5");

        let created = store.get_by_id(6, Projection::Full).await.unwrap();
        assert_eq!(created.key, "x");
        assert_eq!(created.status, ChannelStatus::Enabled);
        assert_eq!(created.created_time, 1_700_000_000);
    }

    #[tokio::test]
    async fn unknown_id_is_skipped_silently() {
        let store = seeded(vec![stored("one", "k1")]).await;
        let items = vec![ImportItem {
            id: 42,
            name: "ghost".into(),
            key: "sk".into(),
            channel_type: 1,
            ..ImportItem::default()
        }];

        let summary = import(&store, items, 0).await;
        assert_eq!(summary, ImportSummary::default());
        assert_eq!(store.list(0, 0, Scope::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_key_leaves_stored_key() {
        let store = seeded(vec![stored("one", "sk-original")]).await;
        let items = vec![ImportItem {
            id: 1,
            key: String::new(),
            models: "claude-3".into(),
            ..ImportItem::default()
        }];

        let summary = import(&store, items, 0).await;
        assert_eq!(summary.updated, 1);
        let record = store.get_by_id(1, Projection::Full).await.unwrap();
        assert_eq!(record.key, "sk-original");
        assert_eq!(record.models, "claude-3");
    }

    #[tokio::test]
    async fn incomplete_new_items_are_skipped() {
        let store = InMemoryChannelStore::new();
        let items = vec![
            ImportItem { key: "k".into(), ..ImportItem::default() },
            ImportItem { channel_type: 3, ..ImportItem::default() },
            ImportItem::default(),
        ];

        let summary = import(&store, items, 0).await;
        assert_eq!(summary, ImportSummary::default());
        assert!(store.list(0, 0, Scope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_status_code_skips_only_that_item() {
        let store = seeded(vec![stored("one", "k1")]).await;
        let items: Vec<ImportItem> = serde_json::from_str(
            r#"[
                {"type": 1, "key": "a"},
                {"type": 1, "key": "b", "status": 4},
                {"id": 1, "name": "bad", "status": -2},
                {"id": 1, "models": "claude-3", "status": 3}
            ]"#,
        )
        .unwrap();

        let summary = import(&store, items, 0).await;
        assert_eq!(summary, ImportSummary { created: 1, updated: 1 });

        let all = store.list(0, 0, Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| c.key != "b"));

        let merged = store.get_by_id(1, Projection::Full).await.unwrap();
        assert_eq!(merged.name, "one");
        assert_eq!(merged.models, "claude-3");
        assert_eq!(merged.status, ChannelStatus::AutoDisabled);
    }

    /// Store whose writes always fail; reads delegate to an inner store.
    struct ReadOnlyStore(InMemoryChannelStore);

    #[async_trait]
    impl ChannelStore for ReadOnlyStore {
        fn name(&self) -> &str {
            "read_only"
        }
        async fn list(
            &self,
            offset: usize,
            limit: usize,
            scope: Scope,
        ) -> std::result::Result<Vec<ChannelRecord>, StoreError> {
            self.0.list(offset, limit, scope).await
        }
        async fn search(&self, keyword: &str) -> std::result::Result<Vec<ChannelRecord>, StoreError> {
            self.0.search(keyword).await
        }
        async fn get_by_id(
            &self,
            id: i64,
            projection: Projection,
        ) -> std::result::Result<ChannelRecord, StoreError> {
            self.0.get_by_id(id, projection).await
        }
        async fn batch_insert(
            &self,
            _records: Vec<ChannelRecord>,
        ) -> std::result::Result<Vec<i64>, StoreError> {
            Err(StoreError::Storage("read-only".into()))
        }
        async fn update(&self, _record: &ChannelRecord) -> std::result::Result<(), StoreError> {
            Err(StoreError::Storage("read-only".into()))
        }
        async fn delete_by_id(&self, _id: i64) -> std::result::Result<(), StoreError> {
            Err(StoreError::Storage("read-only".into()))
        }
        async fn delete_all_disabled(&self) -> std::result::Result<u64, StoreError> {
            Err(StoreError::Storage("read-only".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_are_not_counted() {
        let store = ReadOnlyStore(seeded(vec![stored("one", "k1")]).await);
        let items = vec![
            ImportItem { id: 1, name: "x".into(), ..ImportItem::default() },
            ImportItem {
                channel_type: 1,
                key: "new".into(),
                ..ImportItem::default()
            },
        ];

        let summary = import(&store, items, 0).await;
        assert_eq!(summary, ImportSummary::default());
    }
}
