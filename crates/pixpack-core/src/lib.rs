//! Pixpack Core - Foundational types for the pixpack asset manager
//!
//! This crate provides the types every other pixpack crate depends on:
//! - `Fingerprint` - SHA-256 content fingerprints used as asset keys
//! - `mime_for_name` - MIME tagging by file-name suffix
//! - `is_portable_name` - names that can be written into an archive
//! - Error types and Result alias

mod error;
mod hash;
mod media;
mod names;

pub use error::{PixpackError, Result};
pub use hash::Fingerprint;
pub use media::{mime_for_name, DEFAULT_MIME};
pub use names::{base_name, is_portable_name};
