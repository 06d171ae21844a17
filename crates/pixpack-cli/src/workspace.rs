//! Store, session, and controller wiring shared by every command

use anyhow::{Context, Result};
use pixpack_store::{AssetStore, DiskStorage};
use pixpack_sync::{PixpackConfig, Session, SyncController};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SESSION_FILE: &str = "session.toml";
const METADATA_FILE: &str = "design.json";

pub struct Workspace {
    pub root: PathBuf,
    pub controller: SyncController,
}

impl Workspace {
    /// Resolve config, open the store lazily, and resume the persisted session
    pub async fn open(store: Option<PathBuf>, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => PixpackConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PixpackConfig::load().context("Failed to load config")?,
        };
        let root = store.unwrap_or_else(|| config.store_root.clone());

        let codec = config.codec()?;
        let storage = DiskStorage::new(&root);
        let session = Session::load(&root.join(SESSION_FILE))
            .await
            .context("Failed to load session")?;
        let controller = SyncController::new(
            AssetStore::new(Arc::new(storage)),
            codec,
            config.fetch.clone(),
        )
        .with_session(session);

        Ok(Self { root, controller })
    }

    pub async fn persist_session(&self) -> Result<()> {
        self.controller
            .session()
            .persist(&self.root.join(SESSION_FILE))
            .await
            .context("Failed to save session")
    }

    /// Metadata to export: an explicit file, else the last imported payload, else `{}`
    pub async fn metadata(&self, explicit: Option<&Path>) -> Result<Value> {
        if let Some(path) = explicit {
            return read_json(path).await;
        }
        let kept = self.root.join(METADATA_FILE);
        if tokio::fs::try_exists(&kept).await? {
            return read_json(&kept).await;
        }
        Ok(Value::Object(Default::default()))
    }

    /// Keep the last imported metadata for later exports
    pub async fn remember_metadata(&self, metadata: Option<&Value>) -> Result<()> {
        let kept = self.root.join(METADATA_FILE);
        match metadata {
            Some(value) => {
                tokio::fs::create_dir_all(&self.root).await?;
                tokio::fs::write(&kept, serde_json::to_vec_pretty(value)?).await?;
            }
            None => {
                if tokio::fs::try_exists(&kept).await? {
                    tokio::fs::remove_file(&kept).await?;
                }
            }
        }
        Ok(())
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pixpack_cli_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_metadata_defaults_and_remembers() {
        let dir = temp_dir();
        let config = dir.join("config.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&config, "").unwrap();

        let ws = Workspace::open(Some(dir.join("store")), Some(config.as_path()))
            .await
            .unwrap();
        assert_eq!(ws.metadata(None).await.unwrap(), json!({}));

        ws.remember_metadata(Some(&json!({"stuff": "here"})))
            .await
            .unwrap();
        assert_eq!(ws.metadata(None).await.unwrap(), json!({"stuff": "here"}));

        ws.remember_metadata(None).await.unwrap();
        assert_eq!(ws.metadata(None).await.unwrap(), json!({}));

        std::fs::remove_dir_all(&dir).ok();
    }
}
