//! Pixpack Sync - Moving asset collections in and out of archives
//!
//! Provides the flows that connect byte sources (files, URLs, uploads) and
//! byte sinks to the asset store, plus layered configuration and the
//! session state that remembers where an archive came from.

pub mod config;
pub mod controller;
pub mod session;
pub mod sink;
pub mod source;

pub use config::PixpackConfig;
pub use controller::{ImportReport, IngestReport, SyncController, DEFAULT_EXPORT_NAME};
pub use session::{Handle, Session};
pub use sink::{ByteSink, DirectorySink};
pub use source::{read_full_buffer, Acquired, ArchiveSource, FetchOptions, RawFile};
