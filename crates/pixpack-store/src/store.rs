//! Content-addressed asset store

use crate::storage::AssetStorage;
use crate::types::{AssetContent, AssetRecord, PutOutcome};
use pixpack_core::{is_portable_name, Fingerprint, PixpackError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Fingerprint-keyed asset collection with first-write-wins deduplication.
///
/// `put` is the only way content enters the store, so every record's key is
/// the fingerprint of its bytes and at most one record exists per content.
#[derive(Clone)]
pub struct AssetStore {
    storage: Arc<dyn AssetStorage>,
    // Serializes the check-then-insert in `put` against other writers
    write_lock: Arc<Mutex<()>>,
}

impl AssetStore {
    pub fn new(storage: Arc<dyn AssetStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All records in the store's iteration order
    pub async fn get_all(&self) -> Result<Vec<AssetRecord>> {
        self.storage.get_all().await
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AssetRecord>> {
        self.storage.get(fingerprint).await
    }

    /// Insert `content` under `name` unless identical bytes are already stored.
    ///
    /// `name` becomes the archive entry name on export, so it must be a plain
    /// relative path; anything else fails with `UnsafeEntryName`.
    pub async fn put(&self, name: &str, content: AssetContent) -> Result<PutOutcome> {
        if !is_portable_name(name) {
            return Err(PixpackError::UnsafeEntryName(name.to_string()));
        }
        let fingerprint = Fingerprint::from_bytes(&content.bytes);
        let _guard = self.write_lock.lock().await;

        if self.storage.get(&fingerprint).await?.is_some() {
            debug!(%name, %fingerprint, "duplicate content, keeping existing record");
            return Ok(PutOutcome {
                inserted: false,
                fingerprint,
            });
        }

        if let Some(other) = self.storage.find_by_name(name).await? {
            warn!(
                %name,
                %fingerprint,
                existing = %other,
                "name already used by different content"
            );
        }

        self.storage
            .put(AssetRecord {
                fingerprint,
                name: name.to_string(),
                content,
            })
            .await?;
        debug!(%name, %fingerprint, "inserted record");

        Ok(PutOutcome {
            inserted: true,
            fingerprint,
        })
    }

    /// Remove every record
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.clear().await
    }

    pub async fn len(&self) -> Result<usize> {
        self.storage.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
