//! Channel administration service.
//!
//! Thin façade over a `ChannelStore`: the gateway handlers and the CLI both
//! call into this, never into the store directly.

use std::sync::Arc;

use keyrelay_core::channel::{ChannelRecord, Scope, key_fingerprint};
use keyrelay_core::error::{Error, Result};
use keyrelay_core::store::{ChannelStore, Projection};
use tracing::{debug, info};

use crate::expand::expand_keys;
use crate::export::{self, ExportView};
use crate::reconcile::{self, ImportItem, ImportSummary};

#[derive(Clone)]
pub struct ChannelService {
    store: Arc<dyn ChannelStore>,
    items_per_page: usize,
}

impl ChannelService {
    pub fn new(store: Arc<dyn ChannelStore>, items_per_page: usize) -> Self {
        Self {
            store,
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// One page of channels, newest first, keys redacted. Negative pages
    /// read as page 0.
    pub async fn list(&self, page: i64) -> Result<Vec<ChannelRecord>> {
        let page = usize::try_from(page).unwrap_or(0);
        let offset = page.saturating_mul(self.items_per_page);
        let channels = self
            .store
            .list(offset, self.items_per_page, Scope::Limited)
            .await?;
        debug!(page, count = channels.len(), "Listed channels");
        Ok(channels)
    }

    /// Every channel in `scope`, unpaged. Keys are kept for `Scope::All`.
    pub async fn list_scope(&self, scope: Scope) -> Result<Vec<ChannelRecord>> {
        let channels = self.store.list(0, 0, scope).await?;
        debug!(%scope, count = channels.len(), "Listed channels");
        Ok(channels)
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<ChannelRecord>> {
        let channels = self.store.search(keyword).await?;
        debug!(keyword, count = channels.len(), "Searched channels");
        Ok(channels)
    }

    pub async fn get(&self, id: i64) -> Result<ChannelRecord> {
        Ok(self.store.get_by_id(id, Projection::Redacted).await?)
    }

    /// Create one channel per non-empty line of the submitted key.
    /// Returns how many were created.
    pub async fn add(&self, submission: ChannelRecord) -> Result<usize> {
        let records = expand_keys(&submission, now());
        if records.is_empty() {
            return Err(Error::MalformedInput("no non-empty key provided".into()));
        }

        let fingerprints: Vec<String> = records.iter().map(|r| key_fingerprint(&r.key)).collect();
        let ids = self.store.batch_insert(records).await?;
        info!(
            count = ids.len(),
            name = %submission.name,
            keys = ?fingerprints,
            "Added channels"
        );
        Ok(ids.len())
    }

    /// Replace a channel wholesale. Returns the stored record, redacted.
    pub async fn update(&self, record: ChannelRecord) -> Result<ChannelRecord> {
        if record.id <= 0 {
            return Err(Error::MalformedInput(format!(
                "channel id must be positive, got {}",
                record.id
            )));
        }
        if record.key.is_empty() {
            return Err(Error::MalformedInput("channel key must not be empty".into()));
        }

        self.store.update(&record).await?;
        info!(id = record.id, key = %key_fingerprint(&record.key), "Updated channel");
        Ok(self.store.get_by_id(record.id, Projection::Redacted).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete_by_id(id).await?;
        info!(id, "Deleted channel");
        Ok(())
    }

    pub async fn delete_disabled(&self) -> Result<u64> {
        let count = self.store.delete_all_disabled().await?;
        info!(count, "Deleted disabled channels");
        Ok(count)
    }

    pub async fn export(&self, scope: Scope, include_key: bool) -> Result<Vec<ExportView>> {
        let views = export::export(self.store.as_ref(), scope, include_key).await?;
        info!(%scope, include_key, count = views.len(), "Exported channels");
        Ok(views)
    }

    pub async fn import(&self, items: Vec<ImportItem>) -> ImportSummary {
        let total = items.len();
        let summary = reconcile::import(self.store.as_ref(), items, now()).await;
        info!(
            total,
            created = summary.created,
            updated = summary.updated,
            "Imported channels"
        );
        summary
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
