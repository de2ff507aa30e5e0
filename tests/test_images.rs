//! Asset cache tests: registry/file equivalence, retry behavior, healing.

mod common;

use std::fs;

use common::{cropped_url, image_url, minimal_document, setup_engine};

// ---------------------------------------------------------------------------
// Registry row <-> local file equivalence
// ---------------------------------------------------------------------------

#[test]
fn registry_row_exists_iff_file_exists() {
    let eng = setup_engine(vec![minimal_document(100, 1)]);
    eng.sync.sync().unwrap();

    let img = eng.dir.path().join("img").join("100_1.jpg");
    let cropped = eng.dir.path().join("img_cropped").join("100_1.jpg");
    assert!(img.exists());
    assert!(cropped.exists());
    assert!(eng.sync.store().image_exists(100, 1).unwrap());
    assert!(eng.sync.store().cropped_image_exists(100, 1).unwrap());
}

#[test]
fn failed_fetch_leaves_no_registry_row_and_no_file() {
    let eng = setup_engine(vec![minimal_document(100, 1)]);
    eng.fetcher.fail_url(&image_url(100, 1));

    let report = eng.sync.sync().unwrap();

    // The primary image missed; the cropped variant still succeeded.
    assert_eq!(report.images_missed, 1);
    assert!(!eng.dir.path().join("img").join("100_1.jpg").exists());
    assert!(!eng.sync.store().image_exists(100, 1).unwrap());
    assert!(eng.sync.store().cropped_image_exists(100, 1).unwrap());
    // The card row itself is unaffected by the soft failure.
    assert!(eng.sync.store().card_exists(100).unwrap());
}

#[test]
fn failed_fetch_is_retried_on_the_next_run() {
    let eng = setup_engine(vec![minimal_document(100, 1)]);
    let url = image_url(100, 1);
    eng.fetcher.fail_url(&url);
    eng.sync.sync().unwrap();
    assert_eq!(eng.fetcher.calls_for(&url), 1);

    eng.fetcher.clear_failures();
    let report = eng.sync.sync().unwrap();

    assert_eq!(report.images_missed, 0);
    assert_eq!(eng.fetcher.calls_for(&url), 2);
    assert!(eng.dir.path().join("img").join("100_1.jpg").exists());
    assert!(eng.sync.store().image_exists(100, 1).unwrap());
}

// ---------------------------------------------------------------------------
// Self-healing
// ---------------------------------------------------------------------------

#[test]
fn pre_existing_file_is_registered_without_network_access() {
    let eng = setup_engine(vec![minimal_document(100, 1)]);

    // Simulate a crash between "file written" and "row inserted".
    let img_dir = eng.dir.path().join("img");
    fs::create_dir_all(&img_dir).unwrap();
    fs::write(img_dir.join("100_1.jpg"), b"previously downloaded").unwrap();

    eng.sync.sync().unwrap();

    assert_eq!(eng.fetcher.calls_for(&image_url(100, 1)), 0);
    assert!(eng.sync.store().image_exists(100, 1).unwrap());
    // The existing content was not overwritten.
    let content = fs::read(img_dir.join("100_1.jpg")).unwrap();
    assert_eq!(content, b"previously downloaded");
}

// ---------------------------------------------------------------------------
// Variant independence
// ---------------------------------------------------------------------------

#[test]
fn primary_and_cropped_caches_are_independent() {
    let eng = setup_engine(vec![minimal_document(100, 1)]);
    eng.sync.sync().unwrap();

    // Same image id, separate directories, separate registries.
    let primary = fs::read(eng.dir.path().join("img").join("100_1.jpg")).unwrap();
    let cropped = fs::read(eng.dir.path().join("img_cropped").join("100_1.jpg")).unwrap();
    assert_eq!(primary, format!("image-bytes:{}", image_url(100, 1)).into_bytes());
    assert_eq!(cropped, format!("image-bytes:{}", cropped_url(100, 1)).into_bytes());

    let registered = eng
        .sync
        .store()
        .execute("SELECT local_path FROM card_images_cropped WHERE card_id = 100", &[])
        .unwrap();
    assert_eq!(registered.len(), 1);
    let path = registered[0]["local_path"].as_str().unwrap();
    assert!(path.contains("img_cropped"));
}

#[test]
fn missing_image_url_is_a_miss_without_a_registry_row() {
    let mut doc = minimal_document(100, 1);
    doc["card_images"][0]["image_url"] = serde_json::Value::Null;
    let eng = setup_engine(vec![doc]);

    let report = eng.sync.sync().unwrap();

    assert_eq!(report.images_missed, 1);
    assert!(!eng.sync.store().image_exists(100, 1).unwrap());
    assert!(eng.sync.store().cropped_image_exists(100, 1).unwrap());
}
