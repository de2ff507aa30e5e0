//! Append log writers for set listings and price snapshots.
//!
//! The two writers deliberately diverge: set listings converge to one row per
//! (card, set code, rarity) key with catalog fields refreshed in place, while
//! price snapshots accumulate one row per sync observation as a time series.

use duckdb::params;

use crate::error::Result;
use crate::models::{CardPriceEntry, CardSetEntry};
use crate::store::Store;

/// Upsert one set listing keyed by `(card_id, set_code, set_rarity)`.
///
/// On conflict only the catalog-sourced `set_name` and `set_price` columns
/// are overwritten. `collection_amount` is locally owned and is deliberately
/// excluded from the update, so a re-sync never resets a user's owned count.
pub fn record_set_listing(store: &Store, card_id: i64, entry: &CardSetEntry) -> Result<()> {
    store.raw().execute(
        r#"
        INSERT INTO card_sets (card_id, set_name, set_code, set_rarity, set_price, collection_amount)
        VALUES (?, ?, ?, ?, ?, 0)
        ON CONFLICT (card_id, set_code, set_rarity) DO UPDATE SET
            set_name = excluded.set_name,
            set_price = excluded.set_price
        "#,
        params![
            card_id,
            entry.set_name,
            entry.set_code,
            entry.set_rarity,
            entry.set_price,
        ],
    )?;
    Ok(())
}

/// Append one price snapshot for a card.
///
/// No existence check and no uniqueness: every sync that observes prices adds
/// a new row, building up a price history over repeated runs.
pub fn record_price_snapshot(store: &Store, card_id: i64, entry: &CardPriceEntry) -> Result<()> {
    store.raw().execute(
        r#"
        INSERT INTO card_prices (card_id, tcgplayer_price, ebay_price, amazon_price, cardmarket_price, collection_amount)
        VALUES (?, ?, ?, ?, ?, 0)
        "#,
        params![
            card_id,
            entry.tcgplayer_price,
            entry.ebay_price,
            entry.amazon_price,
            entry.cardmarket_price,
        ],
    )?;
    Ok(())
}
