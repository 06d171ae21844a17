//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `PIXPACK_STORE_DIR`, `PIXPACK_COMPRESSION`
//! 2. Project-local: `.pixpack/config.toml`
//! 3. Global: `~/.pixpack/config.toml`

use crate::source::FetchOptions;
use pixpack_archive::{
    ArchiveCodec, CodecOptions, SuffixRules, DEFAULT_IMAGE_SUFFIXES, DEFAULT_METADATA_ENTRY,
    DEFAULT_METADATA_SUFFIXES,
};
use pixpack_core::{PixpackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_STORE_ROOT: &str = ".pixpack/store";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: usize = 3;

/// `[store]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// `[archive]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSection {
    #[serde(default)]
    pub metadata_entry: Option<String>,
    #[serde(default)]
    pub compression: Option<u32>,
    #[serde(default)]
    pub metadata_suffixes: Option<Vec<String>>,
    #[serde(default)]
    pub image_suffixes: Option<Vec<String>>,
}

/// `[fetch]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchSection {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixpackConfigFile {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub fetch: FetchSection,
}

/// Resolved configuration with defaults and environment overrides applied
#[derive(Debug, Clone)]
pub struct PixpackConfig {
    pub store_root: PathBuf,
    pub codec: CodecOptions,
    pub fetch: FetchOptions,
}

impl Default for PixpackConfig {
    fn default() -> Self {
        Self::resolve(PixpackConfigFile::default())
    }
}

impl PixpackConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = PixpackConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".pixpack/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only, plus env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    /// Build the archive codec these settings describe
    pub fn codec(&self) -> Result<ArchiveCodec> {
        ArchiveCodec::new(self.codec.clone())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pixpack").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<PixpackConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            PixpackError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut PixpackConfigFile, overlay: PixpackConfigFile) {
        if overlay.store.root.is_some() {
            base.store.root = overlay.store.root;
        }

        let archive = overlay.archive;
        if archive.metadata_entry.is_some() {
            base.archive.metadata_entry = archive.metadata_entry;
        }
        if archive.compression.is_some() {
            base.archive.compression = archive.compression;
        }
        if archive.metadata_suffixes.is_some() {
            base.archive.metadata_suffixes = archive.metadata_suffixes;
        }
        if archive.image_suffixes.is_some() {
            base.archive.image_suffixes = archive.image_suffixes;
        }

        if overlay.fetch.timeout_secs.is_some() {
            base.fetch.timeout_secs = overlay.fetch.timeout_secs;
        }
        if overlay.fetch.max_retries.is_some() {
            base.fetch.max_retries = overlay.fetch.max_retries;
        }
    }

    fn apply_env_overrides<F>(config: &mut PixpackConfigFile, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PIXPACK_STORE_DIR") {
            config.store.root = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("PIXPACK_COMPRESSION") {
            config.archive.compression = match level.trim() {
                "" | "none" => None,
                value => Some(value.parse().map_err(|_| {
                    PixpackError::ConfigError(format!(
                        "PIXPACK_COMPRESSION must be a level 0-9 or 'none', got '{}'",
                        value
                    ))
                })?),
            };
        }
        Ok(())
    }

    fn resolve(file: PixpackConfigFile) -> Self {
        let rules = SuffixRules::new(
            file.archive
                .metadata_suffixes
                .unwrap_or_else(|| owned_suffixes(DEFAULT_METADATA_SUFFIXES)),
            file.archive
                .image_suffixes
                .unwrap_or_else(|| owned_suffixes(DEFAULT_IMAGE_SUFFIXES)),
        );

        Self {
            store_root: file
                .store
                .root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_ROOT)),
            codec: CodecOptions {
                metadata_entry: file
                    .archive
                    .metadata_entry
                    .unwrap_or_else(|| DEFAULT_METADATA_ENTRY.to_string()),
                compression: file.archive.compression,
                rules,
            },
            fetch: FetchOptions {
                timeout: Duration::from_secs(
                    file.fetch.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                ),
                max_retries: file.fetch.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            },
        }
    }
}

fn owned_suffixes(suffixes: &[&str]) -> Vec<String> {
    suffixes.iter().map(|s| s.to_string()).collect()
}
