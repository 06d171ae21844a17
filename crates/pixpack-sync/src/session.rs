//! Per-session state carried between flows
//!
//! Sessions are persisted as `session.toml` in the store root so a later
//! process can save back to the archive an earlier one imported.

use pixpack_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the current collection was loaded from or last saved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(PathBuf);

impl Handle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Session state; the handle is absent until the first successful import or save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handle: Option<Handle>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    pub fn set_handle(&mut self, handle: Handle) {
        self.handle = Some(handle);
    }

    pub fn clear_handle(&mut self) {
        self.handle = None;
    }

    /// Load a persisted session; a missing file is a fresh session
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, toml::to_string_pretty(self)?).await?;
        Ok(())
    }
}
