//! Ingest, import, and export flows
//!
//! Each flow runs to completion before the next starts. Import is
//! all-or-nothing up to the point the store is cleared: acquisition and
//! unpacking happen first, so a bad archive never touches the store.

use crate::session::{Handle, Session};
use crate::sink::ByteSink;
use crate::source::{ArchiveSource, FetchOptions, RawFile};
use pixpack_archive::{ArchiveCodec, Unpacked};
use pixpack_core::{base_name, is_portable_name, PixpackError, Result};
use pixpack_store::{AssetContent, AssetStore, PutOutcome};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suggested file name for downloads
pub const DEFAULT_EXPORT_NAME: &str = "export.tar";

/// Aggregate outcome of an ingest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    /// Content already present
    pub skipped: usize,
    /// Names without a recognized image suffix
    pub ignored: usize,
    pub failed: usize,
}

/// Outcome of an import
#[derive(Debug, Default)]
pub struct ImportReport {
    pub source_name: String,
    /// Opaque application payload from the archive
    pub metadata: Option<Value>,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub diagnostics: Vec<PixpackError>,
}

#[derive(Debug, Default)]
struct PutTally {
    inserted: usize,
    skipped: usize,
    failed: usize,
}

impl PutTally {
    fn record(&mut self, name: &str, outcome: Result<PutOutcome>) {
        match outcome {
            Ok(o) if o.inserted => self.inserted += 1,
            Ok(_) => self.skipped += 1,
            Err(e) => {
                warn!(%name, error = %e, "failed to store asset, continuing");
                self.failed += 1;
            }
        }
    }
}

/// Orchestrates the flows between byte sources, the store, and byte sinks
pub struct SyncController {
    store: AssetStore,
    codec: Arc<ArchiveCodec>,
    fetch: FetchOptions,
    session: Session,
}

impl SyncController {
    pub fn new(store: AssetStore, codec: ArchiveCodec, fetch: FetchOptions) -> Self {
        Self {
            store,
            codec: Arc::new(codec),
            fetch,
            session: Session::new(),
        }
    }

    /// Resume a previously persisted session
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Put each selected file into the store, in order
    pub async fn ingest_files(&self, files: Vec<RawFile>) -> Result<IngestReport> {
        if files.is_empty() {
            return Err(PixpackError::NoSourceSelected);
        }

        let mut tally = PutTally::default();
        let mut ignored = 0;
        for file in files {
            let Some(name) = ingest_name(&file.name) else {
                warn!(name = %file.name, "no usable file name, ignoring");
                ignored += 1;
                continue;
            };
            if !self.codec.rules().is_asset(name) {
                debug!(%name, "not a recognized image, ignoring");
                ignored += 1;
                continue;
            }
            let content = AssetContent::for_name(name, file.bytes);
            let outcome = self.store.put(name, content).await;
            tally.record(name, outcome);
        }

        let report = IngestReport {
            inserted: tally.inserted,
            skipped: tally.skipped,
            ignored,
            failed: tally.failed,
        };
        info!(
            inserted = report.inserted,
            skipped = report.skipped,
            ignored = report.ignored,
            failed = report.failed,
            "ingest finished"
        );
        Ok(report)
    }

    /// Replace the store's contents with an archive's assets
    pub async fn import_archive(&mut self, source: ArchiveSource) -> Result<ImportReport> {
        let acquired = source.acquire(&self.fetch).await?;
        let unpacked = self.unpack(acquired.bytes).await?;

        self.store.clear().await?;

        let mut tally = PutTally::default();
        for entry in unpacked.assets {
            let content = AssetContent::for_name(&entry.name, entry.bytes);
            let outcome = self.store.put(&entry.name, content).await;
            tally.record(&entry.name, outcome);
        }

        match acquired.handle {
            Some(handle) => self.session.set_handle(handle),
            None => self.session.clear_handle(),
        }

        for diagnostic in &unpacked.diagnostics {
            warn!(source = %acquired.name, %diagnostic, "import diagnostic");
        }
        info!(
            source = %acquired.name,
            inserted = tally.inserted,
            skipped = tally.skipped,
            failed = tally.failed,
            metadata = unpacked.metadata.is_some(),
            "import finished"
        );

        Ok(ImportReport {
            source_name: acquired.name,
            metadata: unpacked.metadata,
            inserted: tally.inserted,
            skipped: tally.skipped,
            failed: tally.failed,
            diagnostics: unpacked.diagnostics,
        })
    }

    /// Pack the current store contents behind `metadata`
    pub async fn pack_store(&self, metadata: &Value) -> Result<Vec<u8>> {
        let records = self.store.get_all().await?;

        let mut names = HashSet::new();
        for record in &records {
            if !names.insert(record.name.as_str()) {
                warn!(name = %record.name, fingerprint = %record.fingerprint, "exporting colliding entry name");
            }
        }

        let codec = Arc::clone(&self.codec);
        let metadata = metadata.clone();
        tokio::task::spawn_blocking(move || {
            codec.pack(
                &metadata,
                records
                    .iter()
                    .map(|r| (r.name.as_str(), r.content.bytes.as_slice())),
            )
        })
        .await
        .map_err(|e| PixpackError::IoError(std::io::Error::other(e.to_string())))?
    }

    /// Pack the store and deliver it as a fresh download
    pub async fn export_archive(
        &self,
        metadata: &Value,
        sink: &dyn ByteSink,
        suggested_name: &str,
    ) -> Result<()> {
        let bytes = self.pack_store(metadata).await?;
        sink.download(suggested_name, &bytes).await
    }

    /// Pack the store and write it back to the session's handle, or save-as
    /// when there is none. The handle written to is retained.
    pub async fn save_archive(
        &mut self,
        metadata: &Value,
        sink: &dyn ByteSink,
        suggested_name: &str,
    ) -> Result<Handle> {
        let bytes = self.pack_store(metadata).await?;
        let handle = match self.session.handle() {
            Some(handle) => {
                sink.save_to(handle, &bytes).await?;
                handle.clone()
            }
            None => sink.save_as(suggested_name, &bytes).await?,
        };
        self.session.set_handle(handle.clone());
        Ok(handle)
    }

    /// Empty the store and forget the session's handle
    pub async fn clear(&mut self) -> Result<()> {
        self.store.clear().await?;
        self.session.clear_handle();
        Ok(())
    }

    async fn unpack(&self, bytes: Vec<u8>) -> Result<Unpacked> {
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || codec.unpack(&bytes))
            .await
            .map_err(|e| PixpackError::IoError(std::io::Error::other(e.to_string())))?
    }
}

/// Selected files keep their name when it can be archived as is; a path
/// like `/abs/b.png` or `../a.png` is reduced to its file name
fn ingest_name(raw: &str) -> Option<&str> {
    if is_portable_name(raw) {
        Some(raw)
    } else {
        base_name(raw)
    }
}
