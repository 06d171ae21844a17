//! Asset record definitions

use pixpack_core::{mime_for_name, Fingerprint};

/// Stored bytes plus their MIME tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContent {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl AssetContent {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Tag the bytes with the MIME type implied by `name`'s suffix
    pub fn for_name(name: &str, bytes: Vec<u8>) -> Self {
        Self::new(bytes, mime_for_name(name))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The stored unit: a name, byte content, and its fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    /// Primary key, always derived from `content.bytes`
    pub fingerprint: Fingerprint,
    /// Display name as supplied by the source; not unique
    pub name: String,
    pub content: AssetContent,
}

/// Outcome of `AssetStore::put`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    /// False when a record with this fingerprint already existed
    pub inserted: bool,
    pub fingerprint: Fingerprint,
}
