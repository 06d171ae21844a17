//! Store inspection and ingest commands

use crate::workspace::Workspace;
use anyhow::{bail, Result};
use pixpack_core::Fingerprint;
use pixpack_sync::read_full_buffer;
use std::path::PathBuf;

pub async fn run_add(ws: &Workspace, files: &[PathBuf]) -> Result<()> {
    let mut selected = Vec::with_capacity(files.len());
    for path in files {
        selected.push(read_full_buffer(path).await?);
    }

    let report = ws.controller.ingest_files(selected).await?;
    println!(
        "Added {} asset(s), {} already stored, {} ignored",
        report.inserted, report.skipped, report.ignored
    );
    if report.failed > 0 {
        println!("  {} file(s) could not be stored", report.failed);
    }
    Ok(())
}

pub async fn run_list(ws: &Workspace, format: &str) -> Result<()> {
    let records = ws.controller.store().get_all().await?;

    if format == "json" {
        let items: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "fingerprint": r.fingerprint.to_prefixed_hex(),
                    "mime": r.content.mime,
                    "size": r.content.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No assets in {}", ws.root.display());
        return Ok(());
    }

    println!("{} asset(s):\n", records.len());
    for record in &records {
        println!(
            "  {} {} ({}, {} bytes)",
            record.fingerprint,
            record.name,
            record.content.mime,
            record.content.len()
        );
    }
    Ok(())
}

pub async fn run_info(ws: &Workspace, fingerprint: &str) -> Result<()> {
    let Some(fp) = Fingerprint::parse(fingerprint) else {
        bail!("Not a sha256 fingerprint: {}", fingerprint);
    };

    match ws.controller.store().get(&fp).await? {
        Some(record) => {
            println!("Asset: {}", record.name);
            println!("  Fingerprint: {}", record.fingerprint.to_prefixed_hex());
            println!("  Mime: {}", record.content.mime);
            println!("  Size: {} bytes", record.content.len());
        }
        None => {
            println!("No asset with fingerprint {}", fp.to_prefixed_hex());
        }
    }
    Ok(())
}

pub async fn run_clear(ws: &mut Workspace) -> Result<()> {
    ws.controller.clear().await?;
    ws.remember_metadata(None).await?;
    ws.persist_session().await?;
    println!("Store cleared");
    Ok(())
}
