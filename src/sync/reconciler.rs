//! Record reconciler: maps one flattened card record onto the `cards` row.

use duckdb::params;

use crate::error::Result;
use crate::models::CardRecord;
use crate::store::Store;

/// Upsert one card keyed by its catalog id.
///
/// A single atomic `INSERT .. ON CONFLICT` replaces the exists-then-branch
/// round trip: on first sight all columns are inserted, on re-sync every
/// catalog-sourced column is overwritten with the freshly fetched value
/// (last-write-wins, no field-level merge). Update-in-place never creates a
/// duplicate row.
pub fn upsert_card(store: &Store, record: &CardRecord) -> Result<()> {
    store.raw().execute(
        r#"
        INSERT INTO cards (
            id, name, "type", typeline, frameType, "desc",
            atk, def, level, scale, linkval, linkmarkers,
            race, attribute, archetype, banlist_info,
            formats, ocg_date, tcg_date, genesys_points,
            md_rarity, has_effect, treated_as, has_alt_art
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            "type" = excluded."type",
            typeline = excluded.typeline,
            frameType = excluded.frameType,
            "desc" = excluded."desc",
            atk = excluded.atk,
            def = excluded.def,
            level = excluded.level,
            scale = excluded.scale,
            linkval = excluded.linkval,
            linkmarkers = excluded.linkmarkers,
            race = excluded.race,
            attribute = excluded.attribute,
            archetype = excluded.archetype,
            banlist_info = excluded.banlist_info,
            formats = excluded.formats,
            ocg_date = excluded.ocg_date,
            tcg_date = excluded.tcg_date,
            genesys_points = excluded.genesys_points,
            md_rarity = excluded.md_rarity,
            has_effect = excluded.has_effect,
            treated_as = excluded.treated_as,
            has_alt_art = excluded.has_alt_art
        "#,
        params![
            record.id,
            record.name,
            record.type_field,
            record.typeline,
            record.frame_type,
            record.desc,
            record.atk,
            record.def,
            record.level,
            record.scale,
            record.linkval,
            record.linkmarkers,
            record.race,
            record.attribute,
            record.archetype,
            record.banlist_info,
            record.formats,
            record.ocg_date,
            record.tcg_date,
            record.genesys_points,
            record.md_rarity,
            record.has_effect,
            record.treated_as,
            record.has_alt_art,
        ],
    )?;
    Ok(())
}
