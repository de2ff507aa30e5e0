//! Catalog source tests for the saved-dump `FileSource`.

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use ygoprodeck_sync::{CatalogSource, FileSource, SyncError};

fn bulk_body() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"id": 100, "name": "Card 100"},
            {"id": 200, "name": "Card 200"}
        ]
    })
}

#[test]
fn file_source_reads_a_plain_json_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardinfo.json");
    fs::write(&path, serde_json::to_vec(&bulk_body()).unwrap()).unwrap();

    let source = FileSource::new(&path);
    let entries = source.fetch_bulk().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], 100);
}

#[test]
fn file_source_reads_a_gzipped_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardinfo.json.gz");

    let file = fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(&serde_json::to_vec(&bulk_body()).unwrap())
        .unwrap();
    encoder.finish().unwrap();

    let source = FileSource::new(&path);
    let entries = source.fetch_bulk().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["name"], "Card 200");
}

#[test]
fn fetch_by_id_filters_the_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardinfo.json");
    fs::write(&path, serde_json::to_vec(&bulk_body()).unwrap()).unwrap();

    let source = FileSource::new(&path);
    let entries = source.fetch_by_id(200).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], 200);

    assert!(source.fetch_by_id(999).unwrap().is_empty());
}

#[test]
fn missing_data_array_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardinfo.json");
    fs::write(&path, br#"{"error": "rate limited"}"#).unwrap();

    let err = FileSource::new(&path).fetch_bulk().unwrap_err();
    assert!(matches!(err, SyncError::Source(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = FileSource::new("/nonexistent/cardinfo.json")
        .fetch_bulk()
        .unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));
}
