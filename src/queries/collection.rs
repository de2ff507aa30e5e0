//! Collection tracking over the synced store.
//!
//! The `collection_amount` counters on `card_sets` live here on the read and
//! write side; the sync engine only ever creates them at zero and never
//! touches them afterwards.

use duckdb::params;
use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::store::Store;

/// A card as listed within one set, with its cached artwork path if any.
#[derive(Debug, Clone, Deserialize)]
pub struct SetCard {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub set_code: Option<String>,
    pub set_rarity: Option<String>,
    pub local_path: Option<String>,
}

/// Query interface for set listings and owned-copy counters.
pub struct CollectionQuery<'a> {
    store: &'a Store,
}

impl<'a> CollectionQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Distinct set names present in the store, sorted.
    pub fn set_names(&self) -> Result<Vec<String>> {
        let rows = self.store.execute(
            "SELECT DISTINCT set_name FROM card_sets \
             WHERE set_name IS NOT NULL ORDER BY set_name",
            &[],
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.get("set_name").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }

    /// Cards listed in the named set, joined with their first cached image
    /// path.
    ///
    /// One row per set listing: a card with alternate art collapses to its
    /// lowest-id artwork rather than repeating per cached image.
    pub fn cards_in_set(&self, set_name: &str) -> Result<Vec<SetCard>> {
        self.store.execute_into(
            r#"
            SELECT c.id, c.name, c."type", cs.set_code, cs.set_rarity,
                   MIN(ci.local_path) AS local_path
            FROM cards c
            JOIN card_sets cs ON c.id = cs.card_id
            LEFT JOIN card_images ci ON c.id = ci.card_id
            WHERE cs.set_name = ?
            GROUP BY c.id, c.name, c."type", cs.set_code, cs.set_rarity
            ORDER BY cs.set_code
            "#,
            &[set_name.to_string()],
        )
    }

    /// Owned-copy count for one `(card, set code, rarity)` listing.
    ///
    /// Returns `None` when the listing does not exist.
    pub fn owned_amount(
        &self,
        card_id: i64,
        set_code: &str,
        set_rarity: &str,
    ) -> Result<Option<i64>> {
        let value = self.store.execute_scalar(
            "SELECT collection_amount FROM card_sets \
             WHERE card_id = ? AND set_code = ? AND set_rarity = ?",
            &[
                card_id.to_string(),
                set_code.to_string(),
                set_rarity.to_string(),
            ],
        )?;
        Ok(value.and_then(|v| v.as_i64()))
    }

    /// Set the owned-copy count for one listing.
    ///
    /// Fails with [`SyncError::NotFound`] when the listing has not been
    /// observed by any sync, rather than inventing a row the catalog never
    /// reported.
    pub fn set_owned_amount(
        &self,
        card_id: i64,
        set_code: &str,
        set_rarity: &str,
        amount: i64,
    ) -> Result<()> {
        let changed = self.store.raw().execute(
            "UPDATE card_sets SET collection_amount = ? \
             WHERE card_id = ? AND set_code = ? AND set_rarity = ?",
            params![amount, card_id, set_code, set_rarity],
        )?;
        if changed == 0 {
            return Err(SyncError::NotFound(format!(
                "set listing ({}, {}, {})",
                card_id, set_code, set_rarity
            )));
        }
        Ok(())
    }

    /// Total owned copies of a card across all of its set listings.
    pub fn total_owned(&self, card_id: i64) -> Result<i64> {
        let value = self.store.execute_scalar(
            "SELECT COALESCE(SUM(collection_amount), 0) FROM card_sets WHERE card_id = ?",
            &[card_id.to_string()],
        )?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }
}
