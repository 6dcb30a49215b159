//! Channel administration for keyrelay.
//!
//! Everything between the HTTP/CLI surfaces and the store:
//! - **expand** splits a multi-line key submission into one channel per key
//! - **reconcile** merges or creates channels from a bulk import
//! - **export** projects channels into the transfer format
//! - **service** ties them together with the CRUD accessors

pub mod expand;
pub mod export;
pub mod reconcile;
pub mod service;

pub use expand::{expand_keys, split_keys};
pub use export::ExportView;
pub use reconcile::{ImportAction, ImportItem, ImportSummary};
pub use service::ChannelService;
