//! Card lookups against the synced `cards` and image registry tables.

use serde::Deserialize;

use crate::error::Result;
use crate::store::Store;

/// A stored card row, as read back from the local store.
///
/// Serialized columns (`typeline`, `linkmarkers`, `banlist_info`, `formats`)
/// are returned as their stored JSON text so downstream readers keep the
/// exact round-trip encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCard {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub typeline: Option<String>,
    #[serde(rename = "frameType")]
    pub frame_type: Option<String>,
    pub desc: Option<String>,
    pub atk: Option<i64>,
    pub def: Option<i64>,
    pub level: Option<i64>,
    pub scale: Option<i64>,
    pub linkval: Option<i64>,
    pub linkmarkers: Option<String>,
    pub race: Option<String>,
    pub attribute: Option<String>,
    pub archetype: Option<String>,
    pub banlist_info: Option<String>,
    pub formats: Option<String>,
    pub ocg_date: Option<String>,
    pub tcg_date: Option<String>,
    pub genesys_points: Option<i64>,
    pub md_rarity: Option<String>,
    pub has_effect: Option<i64>,
    pub treated_as: Option<String>,
    pub has_alt_art: Option<i64>,
}

/// Query interface for stored cards.
pub struct CardQuery<'a> {
    store: &'a Store,
}

impl<'a> CardQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a card by catalog id.
    pub fn get(&self, id: i64) -> Result<Option<StoredCard>> {
        let cards: Vec<StoredCard> = self.store.execute_into(
            "SELECT * FROM cards WHERE id = ?",
            &[id.to_string()],
        )?;
        Ok(cards.into_iter().next())
    }

    /// Find cards whose name contains `fragment` (case-insensitive).
    pub fn search_by_name(&self, fragment: &str) -> Result<Vec<StoredCard>> {
        self.store.execute_into(
            "SELECT * FROM cards WHERE name ILIKE '%' || ? || '%' ORDER BY name",
            &[fragment.to_string()],
        )
    }

    /// Number of cards in the local store.
    pub fn count(&self) -> Result<i64> {
        let value = self
            .store
            .execute_scalar("SELECT COUNT(*) FROM cards", &[])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Local paths of this card's cached full-size images.
    pub fn image_paths(&self, card_id: i64) -> Result<Vec<String>> {
        let rows = self.store.execute(
            "SELECT local_path FROM card_images WHERE card_id = ? ORDER BY image_id",
            &[card_id.to_string()],
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.get("local_path").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }
}
