//! Pixpack Archive - Portable asset bundles
//!
//! Packs a metadata value plus named asset bytes into a single archive
//! buffer and unpacks such buffers, classifying entries by name suffix.

mod codec;
mod entry;

pub use codec::{ArchiveCodec, ArchiveEntry, CodecOptions, Unpacked, DEFAULT_METADATA_ENTRY};
pub use entry::{EntryKind, SuffixRules, DEFAULT_IMAGE_SUFFIXES, DEFAULT_METADATA_SUFFIXES};
