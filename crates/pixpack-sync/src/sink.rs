//! Byte sinks that receive packed archives

use crate::session::Handle;
use async_trait::async_trait;
use pixpack_core::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Destination for an exported archive buffer
#[async_trait]
pub trait ByteSink: Send + Sync {
    /// Deliver a fresh copy under a suggested file name
    async fn download(&self, suggested_name: &str, bytes: &[u8]) -> Result<()>;

    /// Pick a destination, write there, and return a handle to it
    async fn save_as(&self, suggested_name: &str, bytes: &[u8]) -> Result<Handle>;

    /// Overwrite the location a handle points at
    async fn save_to(&self, handle: &Handle, bytes: &[u8]) -> Result<()>;
}

/// Writes archives into a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    save_as_path: Option<PathBuf>,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            save_as_path: None,
        }
    }

    /// Use `path` instead of `<dir>/<suggested name>` for save-as
    pub fn with_save_as_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.save_as_path = Some(path.into());
        self
    }
}

#[async_trait]
impl ByteSink for DirectorySink {
    async fn download(&self, suggested_name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(suggested_name);
        write_file(&path, bytes).await?;
        info!(path = %path.display(), len = bytes.len(), "archive written");
        Ok(())
    }

    async fn save_as(&self, suggested_name: &str, bytes: &[u8]) -> Result<Handle> {
        let path = self
            .save_as_path
            .clone()
            .unwrap_or_else(|| self.dir.join(suggested_name));
        write_file(&path, bytes).await?;
        info!(path = %path.display(), len = bytes.len(), "archive saved");
        Ok(Handle::new(path))
    }

    async fn save_to(&self, handle: &Handle, bytes: &[u8]) -> Result<()> {
        write_file(handle.path(), bytes).await?;
        info!(path = %handle.path().display(), len = bytes.len(), "archive saved back");
        Ok(())
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("partial");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pixpack_sink_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_download_writes_suggested_name() {
        let dir = temp_dir();
        let sink = DirectorySink::new(&dir);
        sink.download("export.tar", b"archive").await.unwrap();

        assert_eq!(std::fs::read(dir.join("export.tar")).unwrap(), b"archive");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_save_as_then_save_to() {
        let dir = temp_dir();
        let target = dir.join("chosen").join("mine.tar");
        let sink = DirectorySink::new(&dir).with_save_as_path(&target);

        let handle = sink.save_as("export.tar", b"v1").await.unwrap();
        assert_eq!(handle.path(), target.as_path());
        assert!(!dir.join("export.tar").exists());

        sink.save_to(&handle, b"v2").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"v2");

        std::fs::remove_dir_all(&dir).ok();
    }
}
