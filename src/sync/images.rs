//! Asset cache: fetch each card image at most once, register it exactly once.
//!
//! Two independent instances exist, one for full-size artwork and one for the
//! cropped variant. They share the contract but use separate directories and
//! separate registry tables, keyed by the same image id.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use duckdb::params;

use crate::config;
use crate::error::Result;
use crate::source::AssetFetcher;
use crate::store::Store;

/// Outcome of [`ImageCache::ensure_cached`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOutcome {
    /// The binary was fetched from the remote URL and registered.
    Fresh(PathBuf),
    /// A local file already existed; registered without network access.
    Existing(PathBuf),
    /// No local file and the fetch failed or no URL was supplied. No registry
    /// row is written, so a later run retries automatically.
    Miss,
}

pub struct ImageCache {
    dir: PathBuf,
    table: &'static str,
    id_column: &'static str,
    fetcher: Arc<dyn AssetFetcher>,
}

impl ImageCache {
    /// Cache for full-size artwork, registered in `card_images`.
    pub fn primary(dir: PathBuf, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            dir,
            table: "card_images",
            id_column: "image_id",
            fetcher,
        }
    }

    /// Cache for cropped artwork, registered in `card_images_cropped`.
    pub fn cropped(dir: PathBuf, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            dir,
            table: "card_images_cropped",
            id_column: "image_cropped_id",
            fetcher,
        }
    }

    /// Directory holding this cache's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic local path for `(card_id, image_id)`.
    pub fn path_for(&self, card_id: i64, image_id: i64) -> PathBuf {
        config::image_path(&self.dir, card_id, image_id)
    }

    /// Ensure the image is cached locally and registered in the store.
    ///
    /// The file-existence check runs before any network or registry access:
    /// a crash between "file written" and "row inserted" self-heals on the
    /// next run because the existing file is simply re-registered. The
    /// registry insert uses `INSERT OR IGNORE`, so repeated runs never
    /// violate the composite-key uniqueness.
    pub fn ensure_cached(
        &self,
        store: &Store,
        card_id: i64,
        image_id: i64,
        url: Option<&str>,
    ) -> Result<CacheOutcome> {
        let path = self.path_for(card_id, image_id);

        let fresh = if path.exists() {
            false
        } else {
            let Some(url) = url else {
                return Ok(CacheOutcome::Miss);
            };
            match self.download(url, &path) {
                Ok(()) => true,
                Err(e) => {
                    eprintln!(
                        "Failed to fetch image {} for card {} from {}: {}",
                        image_id, card_id, url, e
                    );
                    return Ok(CacheOutcome::Miss);
                }
            }
        };

        // Registry row only after a confirmed local file, never speculatively.
        let sql = format!(
            "INSERT OR IGNORE INTO {} (card_id, {}, local_path) VALUES (?, ?, ?)",
            self.table, self.id_column
        );
        store.raw().execute(
            &sql,
            params![card_id, image_id, path.to_string_lossy().into_owned()],
        )?;

        if fresh {
            Ok(CacheOutcome::Fresh(path))
        } else {
            Ok(CacheOutcome::Existing(path))
        }
    }

    /// Download to a temp file and rename into place, so a half-written file
    /// is never left at the final path.
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let tmp_dest = dest.with_extension(format!(
            "{}.tmp",
            dest.extension().and_then(|e| e.to_str()).unwrap_or("")
        ));

        let result = (|| -> Result<()> {
            let bytes = self.fetcher.fetch(url)?;
            fs::write(&tmp_dest, &bytes)?;
            fs::rename(&tmp_dest, dest)?;
            Ok(())
        })();

        if result.is_err() {
            // Clean up partial temp file on any error
            let _ = fs::remove_file(&tmp_dest);
        }

        result
    }
}
