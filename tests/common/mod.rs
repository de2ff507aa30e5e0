//! Shared test fixtures for the sync engine integration tests.
//!
//! Provides a catalog source and asset fetcher double plus `setup_engine()`,
//! which builds a `YgoSync` against an in-memory store and a temporary data
//! directory. Tests hold clones of the shared catalog entries to mutate the
//! "remote" between runs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use ygoprodeck_sync::{AssetFetcher, CatalogSource, Result, SyncError, YgoSync};

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Catalog source serving a shared, mutable list of raw document values.
pub struct MockSource {
    entries: Arc<Mutex<Vec<serde_json::Value>>>,
    fail_bulk: Arc<AtomicBool>,
}

impl MockSource {
    pub fn new(
        entries: Arc<Mutex<Vec<serde_json::Value>>>,
        fail_bulk: Arc<AtomicBool>,
    ) -> Self {
        Self { entries, fail_bulk }
    }
}

impl CatalogSource for MockSource {
    fn fetch_bulk(&self) -> Result<Vec<serde_json::Value>> {
        if self.fail_bulk.load(Ordering::Relaxed) {
            return Err(SyncError::Source("simulated bulk failure".to_string()));
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    fn fetch_by_id(&self, id: i64) -> Result<Vec<serde_json::Value>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.get("id").and_then(|v| v.as_i64()) == Some(id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Asset fetcher double. Serves deterministic bytes for any URL unless the
/// URL has been marked as failing, and records every fetch attempt.
#[derive(Default)]
pub struct MockFetcher {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make fetches of `url` fail (simulating a timeout or non-2xx status).
    pub fn fail_url(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Let previously failing URLs succeed again.
    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Total fetch attempts so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Fetch attempts for one URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl AssetFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url) {
            return Err(SyncError::Source(format!(
                "simulated fetch failure for {}",
                url
            )));
        }
        Ok(format!("image-bytes:{}", url).into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Engine fixture
// ---------------------------------------------------------------------------

/// A `YgoSync` wired to the doubles, plus handles to drive them.
pub struct TestEngine {
    pub sync: YgoSync,
    pub entries: Arc<Mutex<Vec<serde_json::Value>>>,
    pub fail_bulk: Arc<AtomicBool>,
    pub fetcher: Arc<MockFetcher>,
    /// Keeps the data directory alive for the duration of the test.
    pub dir: TempDir,
}

/// Build an engine over an in-memory store and a temp data directory.
pub fn setup_engine(entries: Vec<serde_json::Value>) -> TestEngine {
    let dir = tempfile::tempdir().unwrap();
    let entries = Arc::new(Mutex::new(entries));
    let fail_bulk = Arc::new(AtomicBool::new(false));
    let fetcher = Arc::new(MockFetcher::new());

    let sync = YgoSync::builder()
        .data_dir(dir.path())
        .in_memory(true)
        .source(Box::new(MockSource::new(entries.clone(), fail_bulk.clone())))
        .fetcher(fetcher.clone())
        .build()
        .unwrap();

    TestEngine {
        sync,
        entries,
        fail_bulk,
        fetcher,
        dir,
    }
}

// ---------------------------------------------------------------------------
// Sample documents
// ---------------------------------------------------------------------------

/// A fully populated card document: one image, one set entry, one price entry.
pub fn sample_document(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("Card {}", id),
        "type": "Effect Monster",
        "frameType": "effect",
        "desc": "Cannot be destroyed by battle.",
        "atk": 2500,
        "def": 2100,
        "level": 7,
        "race": "Dragon",
        "attribute": "LIGHT",
        "archetype": "Test Archetype",
        "misc_info": [{
            "ocg_date": "2004-05-27",
            "tcg_date": "2004-10-12",
            "formats": ["TCG", "OCG"],
            "genesys_points": 20,
            "md_rarity": "Ultra Rare",
            "has_effect": 1
        }],
        "card_images": [{
            "id": id,
            "image_url": image_url(id, id),
            "image_url_cropped": cropped_url(id, id)
        }],
        "card_sets": [{
            "set_name": "Test Set",
            "set_code": format!("TST-{:03}", id % 1000),
            "set_rarity": "Common",
            "set_price": "0.99"
        }],
        "card_prices": [{
            "tcgplayer_price": "1.23",
            "ebay_price": "1.50",
            "amazon_price": "2.00",
            "cardmarket_price": "1.10"
        }]
    })
}

/// A minimal document: one image entry, no sets, no prices, no misc info.
pub fn minimal_document(id: i64, image_id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("Card {}", id),
        "card_images": [{
            "id": image_id,
            "image_url": image_url(id, image_id),
            "image_url_cropped": cropped_url(id, image_id)
        }]
    })
}

pub fn image_url(card_id: i64, image_id: i64) -> String {
    format!("https://images.test/{}_{}.jpg", card_id, image_id)
}

pub fn cropped_url(card_id: i64, image_id: i64) -> String {
    format!("https://images.test/cropped/{}_{}.jpg", card_id, image_id)
}

/// Count rows in a table via the engine's store.
pub fn count_rows(sync: &YgoSync, table: &str) -> i64 {
    sync.store()
        .execute_scalar(&format!("SELECT COUNT(*) FROM {}", table), &[])
        .unwrap()
        .and_then(|v| v.as_i64())
        .unwrap()
}
