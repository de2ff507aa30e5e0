//! Async wrapper around [`YgoSync`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all engine operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while a
//! sync run blocks on network and disk.
//!
//! # Example
//!
//! ```no_run
//! use ygoprodeck_sync::AsyncYgoSync;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sync = AsyncYgoSync::builder().build().await.unwrap();
//!
//!     let report = sync.sync().await.unwrap();
//!     eprintln!("{} cards synced", report.cards_synced);
//!
//!     // Run any blocking engine method via closure
//!     let card = sync.run(|s| s.cards().get(46986414)).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::source::{AssetFetcher, CatalogSource};
use crate::sync::{CancelToken, SyncReport};
use crate::YgoSync;

// ---------------------------------------------------------------------------
// AsyncYgoSyncBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncYgoSync`] instance.
#[derive(Default)]
pub struct AsyncYgoSyncBuilder {
    data_dir: Option<PathBuf>,
    in_memory: bool,
    timeout: Option<Duration>,
    bulk_timeout: Option<Duration>,
    source: Option<Box<dyn CatalogSource>>,
    fetcher: Option<Arc<dyn AssetFetcher>>,
}

impl AsyncYgoSyncBuilder {
    /// Set a custom data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the database in memory instead of a file.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Set the per-image download timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the bulk catalog request timeout.
    pub fn bulk_timeout(mut self, timeout: Duration) -> Self {
        self.bulk_timeout = Some(timeout);
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

    /// Build the async engine, opening the store and running the schema
    /// guard on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncYgoSync> {
        tokio::task::spawn_blocking(move || {
            let mut builder = YgoSync::builder().in_memory(self.in_memory);
            if let Some(dir) = self.data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(timeout) = self.bulk_timeout {
                builder = builder.bulk_timeout(timeout);
            }
            if let Some(source) = self.source {
                builder = builder.source(source);
            }
            if let Some(fetcher) = self.fetcher {
                builder = builder.fetcher(fetcher);
            }
            let sync = builder.build()?;
            Ok(AsyncYgoSync {
                inner: Arc::new(Mutex::new(sync)),
            })
        })
        .await
        .map_err(|e| SyncError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncYgoSync
// ---------------------------------------------------------------------------

/// Async wrapper around [`YgoSync`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying engine is protected by a
/// [`Mutex`], which also serializes writes: the store keeps exactly one
/// writer even when the wrapper is shared across tasks.
pub struct AsyncYgoSync {
    inner: Arc<Mutex<YgoSync>>,
}

impl AsyncYgoSync {
    /// Create a new builder for configuring the async engine.
    pub fn builder() -> AsyncYgoSyncBuilder {
        AsyncYgoSyncBuilder::default()
    }

    /// Run a blocking engine operation on the blocking thread pool.
    ///
    /// The closure receives a `&YgoSync` reference and should return a
    /// `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&YgoSync) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sync = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sync
                .lock()
                .map_err(|_| SyncError::InvalidArgument("engine lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| SyncError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Run a full catalog sync asynchronously.
    pub async fn sync(&self) -> Result<SyncReport> {
        self.run(|s| s.sync()).await
    }

    /// Run a full catalog sync with cooperative cancellation.
    ///
    /// The token can be cancelled from any task while the run is in flight.
    pub async fn sync_with(&self, cancel: CancelToken) -> Result<SyncReport> {
        self.run(move |s| s.sync_with(&cancel)).await
    }

    /// Sync a single card by catalog id.
    pub async fn sync_card(&self, card_id: i64) -> Result<SyncReport> {
        self.run(move |s| s.sync_card(card_id)).await
    }
}
