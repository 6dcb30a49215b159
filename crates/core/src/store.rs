//! Store trait — persistence capability for channel records.
//!
//! The admin core never talks to a database directly; it calls through this
//! narrow interface. Implementations: SQLite and in-memory (for testing).

use async_trait::async_trait;

use crate::channel::{ChannelRecord, Scope};
use crate::error::StoreError;

/// Whether a single-record fetch may return the credential key.
///
/// Reads meant for display use `Redacted`. The import merge must use `Full`
/// so that it sees the stored key before deciding whether to overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Full,
    Redacted,
}

/// The core ChannelStore trait.
///
/// Every method is one round trip to the backing store. Callers get no
/// atomicity across calls; a fetch followed by an update may race another
/// writer.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Bulk read, newest first. `limit == 0` means no limit; `All` and
    /// `Disabled` ignore pagination.
    async fn list(
        &self,
        offset: usize,
        limit: usize,
        scope: Scope,
    ) -> std::result::Result<Vec<ChannelRecord>, StoreError>;

    /// Channels whose id equals the keyword or whose name starts with it.
    /// Keys are redacted.
    async fn search(&self, keyword: &str) -> std::result::Result<Vec<ChannelRecord>, StoreError>;

    /// Fetch one channel.
    async fn get_by_id(
        &self,
        id: i64,
        projection: Projection,
    ) -> std::result::Result<ChannelRecord, StoreError>;

    /// Insert records, assigning ids. Returns the ids in input order.
    async fn batch_insert(
        &self,
        records: Vec<ChannelRecord>,
    ) -> std::result::Result<Vec<i64>, StoreError>;

    /// Replace every field of the record identified by `record.id`, except
    /// `created_time`.
    async fn update(&self, record: &ChannelRecord) -> std::result::Result<(), StoreError>;

    /// Delete one channel.
    async fn delete_by_id(&self, id: i64) -> std::result::Result<(), StoreError>;

    /// Delete every disabled channel, returning how many were removed.
    async fn delete_all_disabled(&self) -> std::result::Result<u64, StoreError>;
}
