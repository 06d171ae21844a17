//! Durable on-disk storage
//!
//! Each record lives at `<root>/objects/<first-2-hex>/<hex>.bin` next to a
//! `<hex>.asset.toml` sidecar holding its name, MIME tag, and insertion
//! sequence. The sidecar is written last and is the commit point: a `.bin`
//! without a sidecar is not part of the store.
//!
//! Names and counts are answered from an index built from the sidecars when
//! the store is opened and kept current by `put` and `clear`.

use crate::storage::AssetStorage;
use crate::types::{AssetContent, AssetRecord};
use async_trait::async_trait;
use pixpack_core::{Fingerprint, PixpackError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

const OBJECTS_DIR: &str = "objects";
const SIDECAR_SUFFIX: &str = ".asset.toml";

#[derive(Debug, Serialize, Deserialize)]
struct SidecarFile {
    asset: Sidecar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    name: String,
    fingerprint: String,
    mime: String,
    seq: u64,
}

/// In-memory view of the committed sidecars, built once on open
#[derive(Debug, Default)]
struct Index {
    next_seq: u64,
    names: HashMap<Fingerprint, String>,
    by_name: HashMap<String, BTreeSet<Fingerprint>>,
}

impl Index {
    fn insert(&mut self, fingerprint: Fingerprint, name: &str) {
        if let Some(old) = self.names.insert(fingerprint, name.to_string()) {
            self.unlink(&old, &fingerprint);
        }
        self.by_name
            .entry(name.to_string())
            .or_default()
            .insert(fingerprint);
    }

    fn unlink(&mut self, name: &str, fingerprint: &Fingerprint) {
        if let Some(set) = self.by_name.get_mut(name) {
            set.remove(fingerprint);
            if set.is_empty() {
                self.by_name.remove(name);
            }
        }
    }

    fn find(&self, name: &str) -> Option<Fingerprint> {
        self.by_name
            .get(name)
            .and_then(|set| set.iter().next().copied())
    }
}

/// Filesystem-backed storage, opened lazily on first use
pub struct DiskStorage {
    root: PathBuf,
    index: OnceCell<Mutex<Index>>,
}

impl DiskStorage {
    /// Create a storage rooted at `root`; nothing touches the disk until the first operation
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn objects(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    fn shard_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        let hex = fingerprint.to_hex();
        self.objects().join(&hex[..2])
    }

    fn blob_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.shard_dir(fingerprint)
            .join(format!("{}.bin", fingerprint.to_hex()))
    }

    fn sidecar_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.shard_dir(fingerprint)
            .join(format!("{}{}", fingerprint.to_hex(), SIDECAR_SUFFIX))
    }

    async fn open(&self) -> Result<&Mutex<Index>> {
        self.index
            .get_or_try_init(|| async {
                let objects = self.objects();
                fs::create_dir_all(&objects)
                    .await
                    .map_err(|e| unavailable("open", &objects, e))?;

                let mut index = Index::default();
                for sidecar in self.scan_sidecars().await? {
                    let Some(fingerprint) = Fingerprint::parse(&sidecar.fingerprint) else {
                        continue;
                    };
                    index.next_seq = index.next_seq.max(sidecar.seq + 1);
                    index.insert(fingerprint, &sidecar.name);
                }
                debug!(root = %self.root.display(), records = index.names.len(), "opened disk storage");
                Ok::<_, PixpackError>(Mutex::new(index))
            })
            .await
    }

    /// Every readable sidecar, in no particular order
    async fn scan_sidecars(&self) -> Result<Vec<Sidecar>> {
        let objects = self.objects();
        let mut sidecars = Vec::new();

        let mut shards = fs::read_dir(&objects)
            .await
            .map_err(|e| unavailable("scan", &objects, e))?;
        while let Some(shard) = shards
            .next_entry()
            .await
            .map_err(|e| unavailable("scan", &objects, e))?
        {
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let mut files = fs::read_dir(&shard_path)
                .await
                .map_err(|e| unavailable("scan", &shard_path, e))?;
            while let Some(file) = files
                .next_entry()
                .await
                .map_err(|e| unavailable("scan", &shard_path, e))?
            {
                let path = file.path();
                let is_sidecar = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(SIDECAR_SUFFIX))
                    .unwrap_or(false);
                if !is_sidecar {
                    continue;
                }
                match read_sidecar(&path).await {
                    Ok(sidecar) if Fingerprint::parse(&sidecar.fingerprint).is_some() => {
                        sidecars.push(sidecar)
                    }
                    Ok(sidecar) => {
                        warn!(path = %path.display(), name = %sidecar.name, "skipping sidecar with malformed fingerprint")
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable sidecar"),
                }
            }
        }

        Ok(sidecars)
    }

    async fn load(&self, sidecar: Sidecar) -> Result<AssetRecord> {
        let fingerprint = Fingerprint::parse(&sidecar.fingerprint).ok_or_else(|| {
            PixpackError::StorageUnavailable(format!(
                "sidecar for {} has malformed fingerprint {}",
                sidecar.name, sidecar.fingerprint
            ))
        })?;
        let blob = self.blob_path(&fingerprint);
        let bytes = fs::read(&blob)
            .await
            .map_err(|e| unavailable("read", &blob, e))?;
        Ok(AssetRecord {
            fingerprint,
            name: sidecar.name,
            content: AssetContent::new(bytes, sidecar.mime),
        })
    }
}

#[async_trait]
impl AssetStorage for DiskStorage {
    async fn get_all(&self) -> Result<Vec<AssetRecord>> {
        // Held so a concurrent put cannot land between scan and load
        let _index = self.open().await?.lock().await;
        let mut sidecars = self.scan_sidecars().await?;
        sidecars.sort_by_key(|s| s.seq);

        let mut records = Vec::with_capacity(sidecars.len());
        for sidecar in sidecars {
            records.push(self.load(sidecar).await?);
        }
        Ok(records)
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AssetRecord>> {
        let index = self.open().await?.lock().await;
        if !index.names.contains_key(fingerprint) {
            return Ok(None);
        }
        let sidecar = read_sidecar(&self.sidecar_path(fingerprint)).await?;
        self.load(sidecar).await.map(Some)
    }

    async fn put(&self, record: AssetRecord) -> Result<()> {
        let mut index = self.open().await?.lock().await;
        let seq = index.next_seq;

        let dir = self.shard_dir(&record.fingerprint);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| unavailable("create", &dir, e))?;

        write_atomic(&self.blob_path(&record.fingerprint), &record.content.bytes).await?;

        let wrapper = SidecarFile {
            asset: Sidecar {
                name: record.name.clone(),
                fingerprint: record.fingerprint.to_prefixed_hex(),
                mime: record.content.mime,
                seq,
            },
        };
        let text = toml::to_string_pretty(&wrapper)?;
        write_atomic(&self.sidecar_path(&record.fingerprint), text.as_bytes()).await?;

        index.next_seq = seq + 1;
        index.insert(record.fingerprint, &record.name);
        debug!(fingerprint = %record.fingerprint, seq, "stored record");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut index = self.open().await?.lock().await;
        let objects = self.objects();
        fs::remove_dir_all(&objects)
            .await
            .map_err(|e| unavailable("clear", &objects, e))?;
        fs::create_dir_all(&objects)
            .await
            .map_err(|e| unavailable("clear", &objects, e))?;
        *index = Index::default();
        debug!(root = %self.root.display(), "cleared disk storage");
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Fingerprint>> {
        Ok(self.open().await?.lock().await.find(name))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.open().await?.lock().await.names.len())
    }
}

async fn read_sidecar(path: &Path) -> Result<Sidecar> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| unavailable("read", path, e))?;
    let file: SidecarFile = toml::from_str(&text).map_err(|e| {
        PixpackError::StorageUnavailable(format!("failed to parse {}: {}", path.display(), e))
    })?;
    Ok(file.asset)
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)
        .await
        .map_err(|e| unavailable("write", &tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| unavailable("commit", path, e))
}

fn unavailable(op: &str, path: &Path, err: io::Error) -> PixpackError {
    PixpackError::StorageUnavailable(format!("{} {}: {}", op, path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pixpack_test_{}", uuid::Uuid::new_v4()))
    }

    fn record(name: &str, bytes: &[u8]) -> AssetRecord {
        AssetRecord {
            fingerprint: Fingerprint::from_bytes(bytes),
            name: name.to_string(),
            content: AssetContent::for_name(name, bytes.to_vec()),
        }
    }

    #[tokio::test]
    async fn test_lazy_open() {
        let dir = temp_dir();
        let storage = DiskStorage::new(&dir);
        assert!(!dir.exists());

        assert!(storage.get_all().await.unwrap().is_empty());
        assert!(dir.join(OBJECTS_DIR).exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = temp_dir();
        let storage = DiskStorage::new(&dir);
        let r = record("a.png", b"png bytes");
        let fp = r.fingerprint;
        storage.put(r.clone()).await.unwrap();

        let loaded = storage.get(&fp).await.unwrap().unwrap();
        assert_eq!(loaded, r);
        assert_eq!(loaded.content.mime, "image/png");
        assert!(storage
            .get(&Fingerprint::from_bytes(b"missing"))
            .await
            .unwrap()
            .is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_order_survives_reopen() {
        let dir = temp_dir();
        {
            let storage = DiskStorage::new(&dir);
            storage.put(record("z.png", b"one")).await.unwrap();
            storage.put(record("a.png", b"two")).await.unwrap();
        }

        let reopened = DiskStorage::new(&dir);
        reopened.put(record("m.png", b"three")).await.unwrap();
        let names: Vec<_> = reopened
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["z.png", "a.png", "m.png"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_orphan_blob_ignored() {
        let dir = temp_dir();
        let storage = DiskStorage::new(&dir);
        storage.put(record("a.png", b"kept")).await.unwrap();

        let orphan = Fingerprint::from_bytes(b"orphan");
        let shard = storage.shard_dir(&orphan);
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(storage.blob_path(&orphan), b"orphan").unwrap();

        assert_eq!(storage.get_all().await.unwrap().len(), 1);
        assert!(storage.get(&orphan).await.unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_clear_and_find_by_name() {
        let dir = temp_dir();
        let storage = DiskStorage::new(&dir);
        let r = record("a.png", b"bytes");
        let fp = r.fingerprint;
        storage.put(r).await.unwrap();
        assert_eq!(storage.find_by_name("a.png").await.unwrap(), Some(fp));

        storage.clear().await.unwrap();
        assert!(storage.get_all().await.unwrap().is_empty());
        assert_eq!(storage.find_by_name("a.png").await.unwrap(), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_name_index_rebuilt_on_reopen() {
        let dir = temp_dir();
        let a = record("a.png", b"one");
        let b = record("b.png", b"two");
        let (fa, fb) = (a.fingerprint, b.fingerprint);
        {
            let storage = DiskStorage::new(&dir);
            storage.put(a).await.unwrap();
            storage.put(b).await.unwrap();
            assert_eq!(storage.len().await.unwrap(), 2);
        }

        let reopened = DiskStorage::new(&dir);
        assert_eq!(reopened.len().await.unwrap(), 2);
        assert_eq!(reopened.find_by_name("a.png").await.unwrap(), Some(fa));
        assert_eq!(reopened.find_by_name("b.png").await.unwrap(), Some(fb));

        // Replacing a record under a new name moves it in the index
        reopened.put(record("renamed.png", b"one")).await.unwrap();
        assert_eq!(reopened.find_by_name("a.png").await.unwrap(), None);
        assert_eq!(reopened.find_by_name("renamed.png").await.unwrap(), Some(fa));
        assert_eq!(reopened.len().await.unwrap(), 2);

        reopened.clear().await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 0);
        assert_eq!(reopened.find_by_name("b.png").await.unwrap(), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unwritable_root_is_unavailable() {
        let dir = temp_dir();
        std::fs::create_dir_all(dir.parent().unwrap()).unwrap();
        // A regular file where the root directory should be
        std::fs::write(&dir, b"not a directory").unwrap();

        let storage = DiskStorage::new(&dir);
        let err = storage.get_all().await.unwrap_err();
        assert!(matches!(err, PixpackError::StorageUnavailable(_)));

        std::fs::remove_file(&dir).ok();
    }
}
