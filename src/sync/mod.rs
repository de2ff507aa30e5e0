//! The incremental sync engine.
//!
//! Orchestrates one run: bulk fetch from the catalog source, then a strictly
//! sequential per-record pipeline (reconcile card row, cache both image
//! variants, record set and price observations). Source failure before any
//! write is fatal; everything after is isolated to the record or asset it
//! concerns and surfaced through the [`SyncReport`] and stderr.

pub mod images;
pub mod observations;
pub mod reconciler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::models::CardDocument;
use crate::source::CatalogSource;
use crate::store::Store;
use images::{CacheOutcome, ImageCache};

// ---------------------------------------------------------------------------
// SyncReport
// ---------------------------------------------------------------------------

/// Counters accumulated over one sync run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Documents received from the catalog source.
    pub total_records: usize,
    /// Cards upserted (insert or refresh).
    pub cards_synced: usize,
    /// Documents rejected for a missing or invalid identifying key.
    pub malformed: usize,
    /// Images fetched from the network this run (both variants).
    pub images_downloaded: usize,
    /// Image fetches that failed or had no URL; retried on the next run.
    pub images_missed: usize,
    /// Set listings observed (inserted or refreshed).
    pub sets_recorded: usize,
    /// Price snapshot rows appended.
    pub prices_recorded: usize,
    /// True when the run stopped early because of a [`CancelToken`].
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag for a running sync.
///
/// Cancelling stops the engine from starting new records (and therefore new
/// fetches); the record in flight completes its writes, so no partial row
/// states are left behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run a full bulk sync.
pub fn run(
    store: &Store,
    source: &dyn CatalogSource,
    images: &ImageCache,
    cropped: &ImageCache,
    cancel: Option<&CancelToken>,
) -> Result<SyncReport> {
    let entries = source.fetch_bulk()?;
    eprintln!("{} cards found", entries.len());
    sync_entries(store, images, cropped, entries, cancel)
}

/// Run the per-record pipeline for an id-filtered fetch.
pub fn run_for_card(
    store: &Store,
    source: &dyn CatalogSource,
    images: &ImageCache,
    cropped: &ImageCache,
    card_id: i64,
) -> Result<SyncReport> {
    let entries = source.fetch_by_id(card_id)?;
    sync_entries(store, images, cropped, entries, None)
}

fn sync_entries(
    store: &Store,
    images: &ImageCache,
    cropped: &ImageCache,
    entries: Vec<serde_json::Value>,
    cancel: Option<&CancelToken>,
) -> Result<SyncReport> {
    let total = entries.len();
    let mut report = SyncReport {
        total_records: total,
        ..SyncReport::default()
    };

    for (i, entry) in entries.into_iter().enumerate() {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            report.cancelled = true;
            eprintln!("Sync cancelled after {} of {} cards", i, total);
            break;
        }

        let doc: CardDocument = match serde_json::from_value(entry) {
            Ok(doc) => doc,
            Err(e) => {
                report.malformed += 1;
                eprintln!("Skipping malformed card document at position {}: {}", i, e);
                continue;
            }
        };

        process_document(store, images, cropped, &doc, &mut report)?;
        eprintln!(
            "[{}/{}] Card {} synced",
            i + 1,
            total,
            doc.name.as_deref().unwrap_or("<unnamed>")
        );
    }

    Ok(report)
}

/// Process one document end to end.
///
/// Always runs every stage: prior existence of the card row never short
/// circuits the asset, set or price stages.
fn process_document(
    store: &Store,
    images: &ImageCache,
    cropped: &ImageCache,
    doc: &CardDocument,
    report: &mut SyncReport,
) -> Result<()> {
    let record = crate::models::CardRecord::from_document(doc)?;
    reconciler::upsert_card(store, &record)?;
    report.cards_synced += 1;

    for img in &doc.card_images {
        let outcome = images.ensure_cached(store, doc.id, img.id, img.image_url.as_deref())?;
        tally_outcome(&outcome, report);
    }

    for img in &doc.card_images {
        let outcome =
            cropped.ensure_cached(store, doc.id, img.id, img.image_url_cropped.as_deref())?;
        tally_outcome(&outcome, report);
    }

    for set_entry in &doc.card_sets {
        observations::record_set_listing(store, doc.id, set_entry)?;
        report.sets_recorded += 1;
    }

    for price_entry in &doc.card_prices {
        observations::record_price_snapshot(store, doc.id, price_entry)?;
        report.prices_recorded += 1;
    }

    Ok(())
}

fn tally_outcome(outcome: &CacheOutcome, report: &mut SyncReport) {
    match outcome {
        CacheOutcome::Fresh(_) => report.images_downloaded += 1,
        CacheOutcome::Existing(_) => {}
        CacheOutcome::Miss => report.images_missed += 1,
    }
}
