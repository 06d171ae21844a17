//! Storage backends behind the asset store

use crate::types::AssetRecord;
use async_trait::async_trait;
use pixpack_core::{Fingerprint, Result};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Durable key-value storage for asset records, keyed by fingerprint.
///
/// `put` is insert-or-replace; deduplication is the job of
/// [`AssetStore`](crate::AssetStore), never of a backend.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// All records in insertion order
    async fn get_all(&self) -> Result<Vec<AssetRecord>>;

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AssetRecord>>;

    async fn put(&self, record: AssetRecord) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Fingerprint of some record stored under `name`, if any
    async fn find_by_name(&self, name: &str) -> Result<Option<Fingerprint>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| r.fingerprint))
    }

    /// Number of stored records
    async fn len(&self) -> Result<usize> {
        Ok(self.get_all().await?.len())
    }
}

/// In-process storage, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<AssetRecord>,
    index: HashMap<Fingerprint, usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStorage for MemoryStorage {
    async fn get_all(&self) -> Result<Vec<AssetRecord>> {
        Ok(self.inner.lock().await.records.clone())
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AssetRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .index
            .get(fingerprint)
            .map(|&i| inner.records[i].clone()))
    }

    async fn put(&self, record: AssetRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.index.get(&record.fingerprint).copied() {
            Some(i) => inner.records[i] = record,
            None => {
                let i = inner.records.len();
                inner.index.insert(record.fingerprint, i);
                inner.records.push(record);
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.records.clear();
        inner.index.clear();
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Fingerprint>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.fingerprint))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.lock().await.records.len())
    }
}
