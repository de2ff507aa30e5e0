use std::path::{Path, PathBuf};

pub const API_BASE: &str = "https://db.ygoprodeck.com/api/v7";

/// Database file name inside the data directory.
pub const DB_FILE: &str = "cards.db";

/// Directory (relative to the data directory) for full-size card artwork.
pub const IMAGES_DIR: &str = "img";

/// Directory (relative to the data directory) for cropped card artwork.
pub const IMAGES_CROPPED_DIR: &str = "img_cropped";

/// Default HTTP timeout for per-image downloads, in seconds.
pub const IMAGE_TIMEOUT_SECS: u64 = 10;

/// Default HTTP timeout for the bulk catalog request, in seconds.
pub const BULK_TIMEOUT_SECS: u64 = 120;

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("ygoprodeck-sync")
    } else {
        PathBuf::from(".ygoprodeck-sync")
    }
}

/// Deterministic local file name for a cached image: `{card_id}_{image_id}.jpg`.
pub fn image_file_name(card_id: i64, image_id: i64) -> String {
    format!("{}_{}.jpg", card_id, image_id)
}

/// Deterministic local path for a cached image inside `dir`.
pub fn image_path(dir: &Path, card_id: i64, image_id: i64) -> PathBuf {
    dir.join(image_file_name(card_id, image_id))
}
