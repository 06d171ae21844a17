//! CLI command implementations

pub mod archive;
pub mod asset;
