//! DuckDB store wrapper: query execution helpers and identity probes.
//!
//! The store handle is explicit and owned; every component that touches the
//! database receives a `&Store`, which keeps the single-writer discipline
//! visible at the call sites and lets tests run against in-memory stores.

use std::collections::HashMap;
use std::path::Path;

use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Owns the DuckDB connection backing the local card catalog.
pub struct Store {
    conn: DuckDbConnection,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = DuckDbConnection::open(path.as_ref())?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Used by tests; nothing survives the drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Get column metadata AFTER query execution (calling before panics in duckdb-rs)
        let column_names: Vec<String> = rows_result
            .as_ref()
            .unwrap()
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let column_count = rows_result.as_ref().unwrap().column_count();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::new();
            for i in 0..column_count {
                let col_name = &column_names[i];
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter()
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    // -- Identity probes ----------------------------------------------------
    //
    // Point lookups against the unique/primary keys. These pick the
    // insert/update branch only; they never decide whether a record's child
    // assets, sets or prices get processed.

    /// Whether a `cards` row exists for this catalog id.
    pub fn card_exists(&self, card_id: i64) -> Result<bool> {
        self.key_exists("SELECT 1 FROM cards WHERE id = ?", &[card_id])
    }

    /// Whether a primary-image registry row exists for `(card_id, image_id)`.
    pub fn image_exists(&self, card_id: i64, image_id: i64) -> Result<bool> {
        self.key_exists(
            "SELECT 1 FROM card_images WHERE card_id = ? AND image_id = ?",
            &[card_id, image_id],
        )
    }

    /// Whether a cropped-image registry row exists for `(card_id, image_id)`.
    pub fn cropped_image_exists(&self, card_id: i64, image_id: i64) -> Result<bool> {
        self.key_exists(
            "SELECT 1 FROM card_images_cropped WHERE card_id = ? AND image_cropped_id = ?",
            &[card_id, image_id],
        )
    }

    fn key_exists(&self, sql: &str, key: &[i64]) -> Result<bool> {
        let mut stmt = self.conn.prepare(sql)?;
        let params: Vec<&dyn duckdb::ToSql> =
            key.iter().map(|k| k as &dyn duckdb::ToSql).collect();
        let mut rows = stmt.query(params.as_slice())?;
        Ok(rows.next()?.is_some())
    }

    /// Access the underlying DuckDB connection for typed statements.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(format!(
            "blob:{}",
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        )),
        _ => {
            // Dates, intervals and other exotic types are not stored by the
            // sync engine; render them as NULL rather than guessing.
            serde_json::Value::Null
        }
    }
}
