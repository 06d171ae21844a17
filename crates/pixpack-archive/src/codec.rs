//! Packing an asset set into an archive buffer and back
//!
//! The container is a tar stream, gzip-wrapped when a compression level is
//! configured. Headers carry fixed mode and mtime so identical input packs to
//! identical bytes.

use crate::entry::{EntryKind, SuffixRules};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use pixpack_core::{is_portable_name, PixpackError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::io::{Read, Write};
use tracing::{debug, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Default name of the reserved metadata entry
pub const DEFAULT_METADATA_ENTRY: &str = "design.json";

/// A named byte entry read from or written to an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Result of unpacking an archive
#[derive(Debug, Default)]
pub struct Unpacked {
    /// Parsed metadata entry, absent if none was present or parseable
    pub metadata: Option<Value>,
    /// Asset entries in archive order
    pub assets: Vec<ArchiveEntry>,
    /// Non-fatal problems, one per dropped metadata or unsafely named entry
    pub diagnostics: Vec<PixpackError>,
}

/// Codec settings
#[derive(Debug, Clone)]
pub struct CodecOptions {
    pub metadata_entry: String,
    /// Gzip level 0-9; `None` writes a plain tar
    pub compression: Option<u32>,
    pub rules: SuffixRules,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            metadata_entry: DEFAULT_METADATA_ENTRY.to_string(),
            compression: None,
            rules: SuffixRules::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveCodec {
    options: CodecOptions,
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self {
            options: CodecOptions::default(),
        }
    }
}

impl ArchiveCodec {
    /// Create a codec; the metadata entry name must classify as metadata
    pub fn new(options: CodecOptions) -> Result<Self> {
        if options.rules.classify(&options.metadata_entry) != EntryKind::Metadata {
            return Err(PixpackError::ConfigError(format!(
                "metadata entry '{}' does not match any metadata suffix",
                options.metadata_entry
            )));
        }
        if let Some(level) = options.compression {
            if level > 9 {
                return Err(PixpackError::ConfigError(format!(
                    "compression level must be between 0 and 9, got {}",
                    level
                )));
            }
        }
        Ok(Self { options })
    }

    pub fn rules(&self) -> &SuffixRules {
        &self.options.rules
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Pack `metadata` followed by every asset into one archive buffer
    pub fn pack<'a, I>(&self, metadata: &Value, assets: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let meta_bytes = serde_json::to_vec(metadata)?;
        match self.options.compression {
            None => {
                let mut builder = tar::Builder::new(Vec::new());
                self.write_entries(&mut builder, &meta_bytes, assets)?;
                Ok(builder.into_inner()?)
            }
            Some(level) => {
                let encoder = GzEncoder::new(Vec::new(), Compression::new(level));
                let mut builder = tar::Builder::new(encoder);
                self.write_entries(&mut builder, &meta_bytes, assets)?;
                Ok(builder.into_inner()?.finish()?)
            }
        }
    }

    fn write_entries<'a, W, I>(
        &self,
        builder: &mut tar::Builder<W>,
        meta_bytes: &[u8],
        assets: I,
    ) -> Result<()>
    where
        W: Write,
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        append(builder, &self.options.metadata_entry, meta_bytes)?;

        let mut seen = HashSet::new();
        let mut count = 0usize;
        for (name, bytes) in assets {
            if !seen.insert(name) {
                warn!(%name, "duplicate entry name in archive");
            }
            if self.options.rules.classify(name) != EntryKind::Asset {
                warn!(%name, "entry name will not be recognized as an asset on import");
            }
            append(builder, name, bytes)?;
            count += 1;
        }

        debug!(assets = count, "packed archive");
        Ok(())
    }

    /// Unpack an archive buffer, classifying every entry by name.
    ///
    /// A buffer that is not a readable archive fails with `InvalidArchive`
    /// and yields nothing; a bad metadata entry is only a diagnostic.
    pub fn unpack(&self, buffer: &[u8]) -> Result<Unpacked> {
        if buffer.is_empty() {
            return Err(PixpackError::InvalidArchive("empty buffer".to_string()));
        }

        let reader: Box<dyn Read + '_> = if buffer.starts_with(&GZIP_MAGIC) {
            Box::new(GzDecoder::new(buffer))
        } else {
            Box::new(buffer)
        };

        let mut archive = tar::Archive::new(reader);
        let mut unpacked = Unpacked::default();

        for entry in archive.entries().map_err(invalid)? {
            let mut entry = entry.map_err(invalid)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = entry.path().map_err(invalid)?.to_string_lossy().into_owned();
            if !is_portable_name(&name) {
                warn!(%name, "ignoring entry with unsafe name");
                unpacked
                    .diagnostics
                    .push(PixpackError::UnsafeEntryName(name));
                continue;
            }

            // The declared size is untrusted; read what is there and compare
            let declared = entry.size();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).map_err(invalid)?;
            if bytes.len() as u64 != declared {
                return Err(PixpackError::InvalidArchive(format!(
                    "entry {} is truncated: header declares {} bytes, found {}",
                    name,
                    declared,
                    bytes.len()
                )));
            }

            match self.options.rules.classify(&name) {
                EntryKind::Metadata => self.accept_metadata(&mut unpacked, name, &bytes),
                EntryKind::Asset => unpacked.assets.push(ArchiveEntry { name, bytes }),
                EntryKind::Ignored => debug!(%name, "ignoring unrecognized entry"),
            }
        }

        debug!(
            assets = unpacked.assets.len(),
            metadata = unpacked.metadata.is_some(),
            "unpacked archive"
        );
        Ok(unpacked)
    }

    fn accept_metadata(&self, unpacked: &mut Unpacked, name: String, bytes: &[u8]) {
        if unpacked.metadata.is_some() {
            warn!(%name, "ignoring additional metadata entry");
            unpacked
                .diagnostics
                .push(PixpackError::DuplicateMetadata(name));
            return;
        }

        match serde_json::from_slice(bytes) {
            Ok(value) => unpacked.metadata = Some(value),
            Err(e) => {
                warn!(%name, error = %e, "dropping unparsable metadata");
                unpacked.diagnostics.push(PixpackError::CorruptMetadata {
                    entry: name,
                    reason: e.to_string(),
                });
            }
        }
    }
}

fn append<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    builder.append_data(&mut header, name, data)?;
    Ok(())
}

fn invalid(err: std::io::Error) -> PixpackError {
    PixpackError::InvalidArchive(err.to_string())
}
