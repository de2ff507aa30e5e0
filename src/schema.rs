//! Schema evolution guard.
//!
//! Runs once per process start, before any record processing. All DDL here is
//! additive and idempotent: `CREATE TABLE IF NOT EXISTS` plus `ALTER TABLE
//! ADD COLUMN` migrations that treat "column already exists" as an expected,
//! informational outcome. Nothing is ever dropped or narrowed; in particular
//! `card_sets` and `card_prices` survive restarts so the locally-owned
//! `collection_amount` counters are never discarded.

use crate::error::Result;
use crate::store::Store;

/// Create any missing tables and apply pending column migrations.
///
/// Safe to re-run on every startup.
pub fn ensure_schema(store: &Store) -> Result<()> {
    create_tables(store)?;
    apply_migrations(store)?;
    Ok(())
}

fn create_tables(store: &Store) -> Result<()> {
    store.raw().execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id BIGINT PRIMARY KEY,
            name TEXT,
            "type" TEXT,
            typeline TEXT,
            frameType TEXT,
            "desc" TEXT,
            atk BIGINT,
            def BIGINT,
            level BIGINT,
            scale BIGINT,
            linkval BIGINT,
            linkmarkers TEXT,
            race TEXT,
            attribute TEXT,
            archetype TEXT,
            banlist_info TEXT,
            formats TEXT,
            ocg_date TEXT,
            tcg_date TEXT,
            genesys_points BIGINT,
            md_rarity TEXT,
            has_effect BIGINT,
            treated_as TEXT
        );

        CREATE TABLE IF NOT EXISTS card_images (
            card_id BIGINT,
            image_id BIGINT,
            local_path TEXT,
            PRIMARY KEY (card_id, image_id)
        );

        CREATE TABLE IF NOT EXISTS card_images_cropped (
            card_id BIGINT,
            image_cropped_id BIGINT,
            local_path TEXT,
            PRIMARY KEY (card_id, image_cropped_id)
        );

        CREATE TABLE IF NOT EXISTS card_sets (
            card_id BIGINT,
            set_code TEXT,
            set_name TEXT,
            set_rarity TEXT,
            set_price TEXT,
            collection_amount BIGINT DEFAULT 0,
            UNIQUE (card_id, set_code, set_rarity)
        );

        CREATE TABLE IF NOT EXISTS card_prices (
            card_id BIGINT,
            tcgplayer_price TEXT,
            ebay_price TEXT,
            amazon_price TEXT,
            cardmarket_price TEXT,
            collection_amount BIGINT DEFAULT 0
        );
        "#,
    )?;
    Ok(())
}

fn apply_migrations(store: &Store) -> Result<()> {
    if add_column(store, "cards", "has_alt_art", "BIGINT DEFAULT 0")? {
        backfill_has_alt_art(store)?;
    }
    Ok(())
}

/// Add a column, returning `true` if it was actually added.
///
/// A pre-existing column is an expected outcome on every startup after the
/// first, so it is logged and swallowed rather than propagated.
fn add_column(store: &Store, table: &str, column: &str, definition: &str) -> Result<bool> {
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
    match store.raw().execute_batch(&sql) {
        Ok(()) => {
            eprintln!("Migration: added column {}.{}", table, column);
            Ok(true)
        }
        Err(e) if e.to_string().contains("already exists") => {
            eprintln!("Migration: column {}.{} already exists", table, column);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// One-time backfill after `has_alt_art` is introduced: derive the flag from
/// the image registry for rows written before the column existed. Later syncs
/// recompute it from the document's image list.
fn backfill_has_alt_art(store: &Store) -> Result<()> {
    store.raw().execute_batch(
        "UPDATE cards SET has_alt_art = CASE WHEN (
             SELECT COUNT(*) FROM card_images ci WHERE ci.card_id = cards.id
         ) > 1 THEN 1 ELSE 0 END",
    )?;
    Ok(())
}
