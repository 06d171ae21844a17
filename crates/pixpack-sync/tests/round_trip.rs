//! End-to-end flows against on-disk storage and a directory sink

use pixpack_archive::ArchiveCodec;
use pixpack_core::PixpackError;
use pixpack_store::{AssetStore, DiskStorage};
use pixpack_sync::{
    ArchiveSource, DirectorySink, FetchOptions, RawFile, Session, SyncController,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pixpack_e2e_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn disk_controller(root: &Path) -> SyncController {
    SyncController::new(
        AssetStore::new(Arc::new(DiskStorage::new(root.join("store")))),
        ArchiveCodec::default(),
        FetchOptions::default(),
    )
}

#[tokio::test]
async fn export_then_import_into_fresh_store() {
    let dir = temp_dir();
    let sink = DirectorySink::new(dir.join("out"));

    let source = disk_controller(&dir.join("a"));
    source
        .ingest_files(vec![
            RawFile::new("a.png", b"first".to_vec()),
            RawFile::new("b.gif", b"second".to_vec()),
            RawFile::new("dup.png", b"first".to_vec()),
        ])
        .await
        .unwrap();
    source
        .export_archive(&json!({"title": "board"}), &sink, "board.tar")
        .await
        .unwrap();

    let archive_path = dir.join("out").join("board.tar");
    let mut target = disk_controller(&dir.join("b"));
    let report = target
        .import_archive(ArchiveSource::File(archive_path.clone()))
        .await
        .unwrap();

    assert_eq!(report.metadata, Some(json!({"title": "board"})));
    assert_eq!(report.inserted, 2);
    let records = target.store().get_all().await.unwrap();
    let mut pairs: Vec<_> = records
        .iter()
        .map(|r| (r.name.as_str(), r.content.bytes.as_slice()))
        .collect();
    pairs.sort();
    assert_eq!(pairs, vec![("a.png", &b"first"[..]), ("b.gif", &b"second"[..])]);
    assert_eq!(
        target.session().handle().map(|h| h.path().to_path_buf()),
        Some(archive_path)
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn reimporting_same_archive_is_stable() {
    let dir = temp_dir();
    let sink = DirectorySink::new(&dir);

    let mut c = disk_controller(&dir);
    c.ingest_files(vec![RawFile::new("a.png", b"A".to_vec())])
        .await
        .unwrap();
    c.export_archive(&json!({}), &sink, "x.tar").await.unwrap();

    for _ in 0..2 {
        c.import_archive(ArchiveSource::File(dir.join("x.tar")))
            .await
            .unwrap();
        assert_eq!(c.store().get_all().await.unwrap().len(), 1);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn failed_import_keeps_disk_store() {
    let dir = temp_dir();
    let bogus = dir.join("bogus.tar");
    std::fs::write(&bogus, vec![0xAB; 1024]).unwrap();

    let mut c = disk_controller(&dir);
    c.ingest_files(vec![RawFile::new("keep.png", b"K".to_vec())])
        .await
        .unwrap();

    let err = c
        .import_archive(ArchiveSource::File(bogus))
        .await
        .unwrap_err();
    assert!(matches!(err, PixpackError::InvalidArchive(_)));
    assert_eq!(c.store().get_all().await.unwrap()[0].name, "keep.png");
    assert!(c.session().handle().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn save_writes_back_to_imported_file_across_sessions() {
    let dir = temp_dir();
    let archive_path = dir.join("design.tar");
    let session_path = dir.join("session.toml");

    {
        let c = disk_controller(&dir);
        c.ingest_files(vec![RawFile::new("a.png", b"A".to_vec())])
            .await
            .unwrap();
        let sink = DirectorySink::new(&dir);
        c.export_archive(&json!({"v": 1}), &sink, "design.tar")
            .await
            .unwrap();
    }

    {
        let mut c = disk_controller(&dir);
        c.import_archive(ArchiveSource::File(archive_path.clone()))
            .await
            .unwrap();
        c.session().persist(&session_path).await.unwrap();
    }

    let session = Session::load(&session_path).await.unwrap();
    let mut c = disk_controller(&dir).with_session(session);
    c.ingest_files(vec![RawFile::new("b.png", b"B".to_vec())])
        .await
        .unwrap();
    let sink = DirectorySink::new(dir.join("unused"));
    let handle = c.save_archive(&json!({"v": 2}), &sink, "other.tar").await.unwrap();
    assert_eq!(handle.path(), archive_path.as_path());

    let unpacked = ArchiveCodec::default()
        .unpack(&std::fs::read(&archive_path).unwrap())
        .unwrap();
    assert_eq!(unpacked.metadata, Some(json!({"v": 2})));
    assert_eq!(unpacked.assets.len(), 2);
    assert!(!dir.join("unused").exists());

    std::fs::remove_dir_all(&dir).ok();
}
