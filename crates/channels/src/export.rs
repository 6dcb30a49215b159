//! Bulk export of channels in a transfer format.

use keyrelay_core::channel::{ChannelRecord, ChannelStatus, Scope};
use keyrelay_core::error::Result;
use keyrelay_core::store::ChannelStore;
use serde::{Deserialize, Serialize};

/// A channel as written by the export endpoint.
///
/// `key` is absent unless the caller asked for it. `created_time` is never
/// part of the transfer format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportView {
    pub id: i64,
    #[serde(rename = "type")]
    pub channel_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    pub status: ChannelStatus,
    pub weight: Option<u32>,
    pub base_url: Option<String>,
    pub models: String,
    pub group: String,
    pub model_mapping: Option<String>,
    pub priority: Option<i64>,
    pub config: String,
    pub system_prompt: Option<String>,
}

impl ExportView {
    pub fn project(record: ChannelRecord, include_key: bool) -> Self {
        Self {
            id: record.id,
            channel_type: record.channel_type,
            key: include_key.then_some(record.key),
            name: record.name,
            status: record.status,
            weight: record.weight,
            base_url: record.base_url,
            models: record.models,
            group: record.group,
            model_mapping: record.model_mapping,
            priority: record.priority,
            config: record.config,
            system_prompt: record.system_prompt,
        }
    }
}

/// Read every channel in `scope` and project it for transfer.
///
/// `Limited` reads redacted records, so asking for keys there yields empty
/// strings rather than secrets.
pub async fn export(
    store: &dyn ChannelStore,
    scope: Scope,
    include_key: bool,
) -> Result<Vec<ExportView>> {
    let records = store.list(0, 0, scope).await?;
    Ok(records
        .into_iter()
        .map(|record| ExportView::project(record, include_key))
        .collect())
}
