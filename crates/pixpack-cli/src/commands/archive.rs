//! Archive import, export, and save commands

use crate::workspace::Workspace;
use anyhow::Result;
use pixpack_sync::{ArchiveSource, DirectorySink, DEFAULT_EXPORT_NAME};
use std::path::{Path, PathBuf};

pub async fn run_import(ws: &mut Workspace, source: &str, metadata_out: Option<&Path>) -> Result<()> {
    let report = ws
        .controller
        .import_archive(ArchiveSource::parse(source))
        .await?;
    ws.remember_metadata(report.metadata.as_ref()).await?;
    ws.persist_session().await?;

    println!(
        "Imported {} asset(s) from {} ({} duplicate, {} failed)",
        report.inserted, report.source_name, report.skipped, report.failed
    );
    for diagnostic in &report.diagnostics {
        println!("  warning: {}", diagnostic);
    }

    match (report.metadata, metadata_out) {
        (Some(metadata), Some(path)) => {
            tokio::fs::write(path, serde_json::to_vec_pretty(&metadata)?).await?;
            println!("Metadata written to {}", path.display());
        }
        (Some(metadata), None) => println!("{}", serde_json::to_string_pretty(&metadata)?),
        (None, _) => println!("Archive carried no metadata"),
    }
    Ok(())
}

pub async fn run_export(ws: &Workspace, metadata: Option<&Path>, out: &Path, name: &str) -> Result<()> {
    let metadata = ws.metadata(metadata).await?;
    let sink = DirectorySink::new(out);
    ws.controller.export_archive(&metadata, &sink, name).await?;
    println!("Exported to {}", out.join(name).display());
    Ok(())
}

pub async fn run_save(ws: &mut Workspace, metadata: Option<&Path>, save_as: Option<PathBuf>) -> Result<()> {
    let metadata = ws.metadata(metadata).await?;
    let mut sink = DirectorySink::new(".");
    if let Some(path) = save_as {
        sink = sink.with_save_as_path(path);
    }

    let handle = ws
        .controller
        .save_archive(&metadata, &sink, DEFAULT_EXPORT_NAME)
        .await?;
    ws.persist_session().await?;
    println!("Saved to {}", handle.path().display());
    Ok(())
}
