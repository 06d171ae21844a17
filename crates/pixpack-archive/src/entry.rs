//! Classification of archive entries by name suffix

/// Metadata suffixes recognized when none are configured
pub const DEFAULT_METADATA_SUFFIXES: &[&str] = &[".json"];

/// Image suffixes recognized when none are configured
pub const DEFAULT_IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// What an archive entry is, decided once from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Metadata,
    Asset,
    Ignored,
}

/// Recognized name suffixes for metadata and asset entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRules {
    metadata: Vec<String>,
    images: Vec<String>,
}

impl Default for SuffixRules {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_SUFFIXES, DEFAULT_IMAGE_SUFFIXES)
    }
}

impl SuffixRules {
    /// Build rules from suffix lists; matching is case-insensitive
    pub fn new<M, I>(metadata: M, images: I) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            metadata: metadata
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
            images: images
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, name: &str) -> EntryKind {
        let lower = name.to_ascii_lowercase();
        if self.metadata.iter().any(|s| lower.ends_with(s.as_str())) {
            EntryKind::Metadata
        } else if self.images.iter().any(|s| lower.ends_with(s.as_str())) {
            EntryKind::Asset
        } else {
            EntryKind::Ignored
        }
    }

    pub fn is_asset(&self, name: &str) -> bool {
        self.classify(name) == EntryKind::Asset
    }
}
