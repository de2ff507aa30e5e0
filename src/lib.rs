//! Incremental sync engine for the YGOPRODeck card catalog.
//!
//! Mirrors the remote catalog (card metadata, artwork, set listings, prices)
//! into a local DuckDB store, safe to re-run as the catalog changes: card rows
//! are refreshed in place, artwork is fetched at most once, set listings keep
//! their locally-owned collection counters, and price snapshots accumulate as
//! a time series.
//!
//! # Quick start
//!
//! ```no_run
//! use ygoprodeck_sync::YgoSync;
//!
//! let sync = YgoSync::builder().build().unwrap();
//!
//! // Mirror the full catalog
//! let report = sync.sync().unwrap();
//! eprintln!("{} cards synced, {} images downloaded",
//!     report.cards_synced, report.images_downloaded);
//!
//! // Browse the local store
//! let card = sync.cards().get(46986414).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod error;
pub mod models;
pub mod queries;
pub mod schema;
pub mod source;
pub mod store;
pub mod sync;

#[cfg(feature = "async")]
pub use async_client::AsyncYgoSync;
pub use error::{Result, SyncError};
pub use models::{CardDocument, CardRecord};
pub use source::{AssetFetcher, CatalogSource, FileSource, HttpFetcher, YgoprodeckSource};
pub use store::Store;
pub use sync::images::{CacheOutcome, ImageCache};
pub use sync::{CancelToken, SyncReport};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// YgoSyncBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`YgoSync`] instance.
///
/// Use [`YgoSync::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](YgoSyncBuilder::build) to create the engine.
pub struct YgoSyncBuilder {
    data_dir: Option<PathBuf>,
    in_memory: bool,
    timeout: Duration,
    bulk_timeout: Duration,
    source: Option<Box<dyn CatalogSource>>,
    fetcher: Option<Arc<dyn AssetFetcher>>,
}

impl Default for YgoSyncBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            in_memory: false,
            timeout: Duration::from_secs(config::IMAGE_TIMEOUT_SECS),
            bulk_timeout: Duration::from_secs(config::BULK_TIMEOUT_SECS),
            source: None,
            fetcher: None,
        }
    }
}

impl YgoSyncBuilder {
    /// Set a custom data directory.
    ///
    /// Holds the database file and both image directories. If not set, the
    /// platform-appropriate default data directory is used.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the database in memory instead of a file.
    ///
    /// Image directories still live under the data directory. Intended for
    /// tests; nothing in the database survives the drop.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Set the per-image download timeout. Defaults to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the bulk catalog request timeout. Defaults to 120 seconds.
    pub fn bulk_timeout(mut self, timeout: Duration) -> Self {
        self.bulk_timeout = timeout;
        self
    }

    /// Replace the catalog source (saved dump, test double).
    pub fn source(mut self, source: Box<dyn CatalogSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the asset fetcher (test double).
    pub fn fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the engine: open the store and run the schema evolution guard.
    ///
    /// The guard runs exactly once here, before any record processing, and
    /// tolerates already-applied migrations, so repeated process starts
    /// against the same store are safe.
    pub fn build(self) -> Result<YgoSync> {
        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        fs::create_dir_all(&data_dir)?;

        let store = if self.in_memory {
            Store::open_in_memory()?
        } else {
            Store::open(data_dir.join(config::DB_FILE))?
        };
        schema::ensure_schema(&store)?;

        let source: Box<dyn CatalogSource> = match self.source {
            Some(source) => source,
            None => Box::new(YgoprodeckSource::new(self.bulk_timeout)?),
        };
        let fetcher: Arc<dyn AssetFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(self.timeout)?),
        };

        let images = ImageCache::primary(data_dir.join(config::IMAGES_DIR), fetcher.clone());
        let cropped = ImageCache::cropped(data_dir.join(config::IMAGES_CROPPED_DIR), fetcher);

        Ok(YgoSync {
            store,
            source,
            images,
            cropped,
            data_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// YgoSync
// ---------------------------------------------------------------------------

/// The main entry point: a configured sync engine over one local store.
///
/// Owns the [`Store`], the catalog source and both image caches. All
/// processing is strictly sequential through the single store handle
/// (single-writer discipline).
///
/// Created via [`YgoSync::builder()`].
pub struct YgoSync {
    store: Store,
    source: Box<dyn CatalogSource>,
    images: ImageCache,
    cropped: ImageCache,
    data_dir: PathBuf,
}

impl YgoSync {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> YgoSyncBuilder {
        YgoSyncBuilder::default()
    }

    // -- Sync operations ---------------------------------------------------

    /// Run a full catalog sync.
    ///
    /// Fatal if the bulk fetch fails; per-record and per-asset failures are
    /// isolated, reported on stderr and counted in the returned report.
    pub fn sync(&self) -> Result<SyncReport> {
        sync::run(&self.store, &*self.source, &self.images, &self.cropped, None)
    }

    /// Run a full catalog sync with cooperative cancellation.
    ///
    /// Cancelling stops new fetches; the in-flight record completes.
    pub fn sync_with(&self, cancel: &CancelToken) -> Result<SyncReport> {
        sync::run(
            &self.store,
            &*self.source,
            &self.images,
            &self.cropped,
            Some(cancel),
        )
    }

    /// Sync a single card by catalog id through the same pipeline.
    pub fn sync_card(&self, card_id: i64) -> Result<SyncReport> {
        let report =
            sync::run_for_card(&self.store, &*self.source, &self.images, &self.cropped, card_id)?;
        if report.total_records == 0 {
            return Err(SyncError::NotFound(format!("card {}", card_id)));
        }
        Ok(report)
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the card query interface.
    pub fn cards(&self) -> queries::cards::CardQuery<'_> {
        queries::cards::CardQuery::new(&self.store)
    }

    /// Access the collection query interface (set listings, owned counters).
    pub fn collection(&self) -> queries::collection::CollectionQuery<'_> {
        queries::collection::CollectionQuery::new(&self.store)
    }

    // -- Utility -----------------------------------------------------------

    /// The directory holding the database file and image directories.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Return a reference to the underlying [`Store`] for advanced usage.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl fmt::Display for YgoSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YgoSync(data_dir={})", self.data_dir.display())
    }
}
