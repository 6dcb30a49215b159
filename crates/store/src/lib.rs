//! Channel store implementations for keyrelay.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryChannelStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteChannelStore;

use keyrelay_core::error::StoreError;

/// Rejection used by every backend when asked to persist a keyless channel.
pub(crate) fn missing_key_error(id: i64) -> StoreError {
    StoreError::Storage(format!("refusing to persist channel {id} with an empty key"))
}
