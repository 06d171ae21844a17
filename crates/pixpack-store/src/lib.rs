//! Pixpack Store - Content-addressed asset storage
//!
//! This crate provides the fingerprint-keyed asset store, the storage trait
//! it runs on, and in-memory and on-disk backends.

mod disk;
mod storage;
mod store;
mod types;

pub use disk::DiskStorage;
pub use storage::{AssetStorage, MemoryStorage};
pub use store::AssetStore;
pub use types::{AssetContent, AssetRecord, PutOutcome};
