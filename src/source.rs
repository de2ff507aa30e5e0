//! External collaborators: the catalog source and the asset fetcher.
//!
//! Both are traits so the sync engine can be driven by test doubles or by a
//! previously saved catalog dump instead of the live API. The HTTP
//! implementations use `reqwest`'s blocking client, matching the engine's
//! single-threaded, single-writer model.

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;

use crate::config;
use crate::error::{Result, SyncError};

// ---------------------------------------------------------------------------
// CatalogSource
// ---------------------------------------------------------------------------

/// Supplies card documents as raw JSON values (the entries of the API's
/// `data` array).
///
/// Entries are returned untyped so one malformed document can be rejected
/// individually during the sync instead of failing the whole batch decode.
pub trait CatalogSource: Send {
    /// Fetch the complete catalog. Failure here is fatal for a bulk sync.
    fn fetch_bulk(&self) -> Result<Vec<serde_json::Value>>;

    /// Fetch the catalog restricted to a single card id.
    fn fetch_by_id(&self, id: i64) -> Result<Vec<serde_json::Value>>;
}

/// Live YGOPRODeck API source.
pub struct YgoprodeckSource {
    client: Client,
    base_url: String,
}

impl YgoprodeckSource {
    /// Create a source against the production API with the given bulk timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(config::API_BASE, timeout)
    }

    /// Create a source against a custom endpoint (testing, mirrors).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, url: &str) -> Result<Vec<serde_json::Value>> {
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(SyncError::Source(format!(
                "API call to {} failed with status {}",
                url,
                resp.status()
            )));
        }
        let body: serde_json::Value = resp.json()?;
        data_entries(body)
    }
}

impl CatalogSource for YgoprodeckSource {
    fn fetch_bulk(&self) -> Result<Vec<serde_json::Value>> {
        self.request(&format!("{}/cardinfo.php?misc=yes", self.base_url))
    }

    fn fetch_by_id(&self, id: i64) -> Result<Vec<serde_json::Value>> {
        self.request(&format!("{}/cardinfo.php?misc=yes&id={}", self.base_url, id))
    }
}

/// Catalog source backed by a saved bulk response on disk.
///
/// Accepts the same top-level shape as the API (`{"data": [...]}`) either as
/// plain JSON or gzip-compressed (`.gz`), so a dump captured once can seed a
/// store without network access.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<serde_json::Value> {
        if self.path.extension().and_then(|e| e.to_str()) == Some("gz") {
            let file = fs::File::open(&self.path)?;
            let decoder = GzDecoder::new(BufReader::new(file));
            let mut contents = String::new();
            BufReader::new(decoder).read_to_string(&mut contents)?;
            serde_json::from_str(&contents).map_err(Into::into)
        } else {
            let contents = fs::read_to_string(&self.path)?;
            serde_json::from_str(&contents).map_err(Into::into)
        }
    }
}

impl CatalogSource for FileSource {
    fn fetch_bulk(&self) -> Result<Vec<serde_json::Value>> {
        data_entries(self.load()?)
    }

    fn fetch_by_id(&self, id: i64) -> Result<Vec<serde_json::Value>> {
        let entries = self.fetch_bulk()?;
        Ok(entries
            .into_iter()
            .filter(|e| e.get("id").and_then(|v| v.as_i64()) == Some(id))
            .collect())
    }
}

/// Pull the `data` array out of a catalog response.
fn data_entries(mut body: serde_json::Value) -> Result<Vec<serde_json::Value>> {
    match body.get_mut("data").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(entries)) => Ok(entries),
        _ => Err(SyncError::Source(
            "catalog response has no top-level 'data' array".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// AssetFetcher
// ---------------------------------------------------------------------------

/// Resolves a URL to binary content. Failures are reported to the caller,
/// which treats them as a cache miss rather than aborting the run.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP asset fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}
