//! # keyrelay core
//!
//! Domain types, the persistence trait, and error definitions for channel
//! administration. A channel is one configured upstream provider connection:
//! a credential key plus the routing metadata the gateway uses to reach it.
//!
//! This crate carries no framework dependencies. Storage backends live in
//! `keyrelay-store`, the admin logic in `keyrelay-channels`, and both depend
//! inward on the types defined here.

pub mod channel;
pub mod error;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use channel::{ChannelRecord, ChannelStatus, Scope, key_fingerprint};
pub use error::{Error, Result, StoreError};
pub use store::{ChannelStore, Projection};
