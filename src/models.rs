//! Serde models for YGOPRODeck card documents and the flattened row form.
//!
//! [`CardDocument`] mirrors one entry of the API's `data` array. Documents are
//! deserialized individually (not as one typed array) so a single malformed
//! entry can be rejected without aborting the whole sync.
//!
//! [`CardRecord`] is the flattened, storage-ready projection of a document:
//! nested structures serialized to stable JSON text, derived flags computed.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// CardDocument — one entry of the remote catalog response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDocument {
    /// Catalog-assigned card id. The only required field; a document without
    /// it fails deserialization and is reported as malformed.
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub typeline: Option<Vec<String>>,
    #[serde(rename = "frameType")]
    pub frame_type: Option<String>,
    pub desc: Option<String>,
    pub atk: Option<i64>,
    pub def: Option<i64>,
    pub level: Option<i64>,
    pub scale: Option<i64>,
    pub linkval: Option<i64>,
    pub linkmarkers: Option<Vec<String>>,
    pub race: Option<String>,
    pub attribute: Option<String>,
    pub archetype: Option<String>,
    /// Ban-list status per format; the API emits either a string or an object,
    /// so this is kept as raw JSON.
    pub banlist_info: Option<serde_json::Value>,
    /// Extended metadata (`?misc=yes`). Only the first element is consumed.
    #[serde(default)]
    pub misc_info: Vec<MiscInfo>,
    #[serde(default)]
    pub card_images: Vec<CardImage>,
    #[serde(default)]
    pub card_sets: Vec<CardSetEntry>,
    #[serde(default)]
    pub card_prices: Vec<CardPriceEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiscInfo {
    pub genesys_points: Option<i64>,
    pub ocg_date: Option<String>,
    pub tcg_date: Option<String>,
    pub formats: Option<Vec<String>>,
    pub md_rarity: Option<String>,
    pub has_effect: Option<i64>,
    pub treated_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardImage {
    pub id: i64,
    pub image_url: Option<String>,
    pub image_url_cropped: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSetEntry {
    pub set_name: Option<String>,
    pub set_code: Option<String>,
    pub set_rarity: Option<String>,
    pub set_price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPriceEntry {
    pub tcgplayer_price: Option<String>,
    pub ebay_price: Option<String>,
    pub amazon_price: Option<String>,
    pub cardmarket_price: Option<String>,
}

// ---------------------------------------------------------------------------
// CardRecord — flattened, storage-ready projection
// ---------------------------------------------------------------------------

/// One `cards` row as written by the reconciler.
///
/// Produced by [`CardRecord::from_document`], which is a pure function of the
/// input document: no store access, no filesystem access.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub id: i64,
    pub name: Option<String>,
    pub type_field: Option<String>,
    pub typeline: Option<String>,
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
    pub has_alt_art: i64,
}

impl CardRecord {
    /// Flatten a remote document into a `cards` row.
    ///
    /// Missing input fields map to `None` (SQL NULL), never to a sentinel.
    /// Nested structures (`typeline`, `linkmarkers`, `banlist_info`,
    /// `formats`) are serialized to JSON text only when present, so an absent
    /// list is stored as NULL rather than the string `"null"`.
    pub fn from_document(doc: &CardDocument) -> Result<Self> {
        let misc = doc.misc_info.first();

        Ok(Self {
            id: doc.id,
            name: doc.name.clone(),
            type_field: doc.type_field.clone(),
            typeline: to_json_text(doc.typeline.as_ref())?,
            frame_type: doc.frame_type.clone(),
            desc: doc.desc.clone(),
            atk: doc.atk,
            def: doc.def,
            level: doc.level,
            scale: doc.scale,
            linkval: doc.linkval,
            linkmarkers: to_json_text(doc.linkmarkers.as_ref())?,
            race: doc.race.clone(),
            attribute: doc.attribute.clone(),
            archetype: doc.archetype.clone(),
            banlist_info: to_json_text(doc.banlist_info.as_ref())?,
            formats: to_json_text(misc.and_then(|m| m.formats.as_ref()))?,
            ocg_date: misc.and_then(|m| m.ocg_date.clone()),
            tcg_date: misc.and_then(|m| m.tcg_date.clone()),
            genesys_points: misc.and_then(|m| m.genesys_points),
            md_rarity: misc.and_then(|m| m.md_rarity.clone()),
            has_effect: misc.and_then(|m| m.has_effect),
            treated_as: misc.and_then(|m| m.treated_as.clone()),
            has_alt_art: has_alternate_art(doc) as i64,
        })
    }
}

/// A card has alternate artwork when the document carries more than one image
/// entry. Purely a count over the document's image list, independent of
/// which images are cached locally.
pub fn has_alternate_art(doc: &CardDocument) -> bool {
    doc.card_images.len() > 1
}

fn to_json_text<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Into::into)
}
