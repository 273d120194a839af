//! Raw collection CRUD over JSON rows.
//! This layer carries the exact merge and timestamp semantics of the
//! persisted encoding; the typed layer in `records` builds on it and
//! validates rows at the store boundary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::{JsonMap, Rows, Store};

/// Collection slots seeded and recognized by the store, one medium key each.
pub const COLLECTION_KEYS: [&str; 6] = [
    "users",
    "products",
    "orders",
    "invoices",
    "milestones",
    "notifications",
];

pub(crate) fn row_id(row: &JsonMap) -> Option<&str> {
    row.get("_id").and_then(|v| v.as_str())
}

/// Shallow merge: patch keys overwrite, unspecified fields persist.
/// Identity and creation time are immutable once assigned.
pub(crate) fn merge_patch(row: &mut JsonMap, patch: JsonMap) {
    for (k, v) in patch {
        if k == "_id" || k == "createdAt" {
            continue;
        }
        row.insert(k, v);
    }
}

/// Force `updatedAt` to now, clamped so it never precedes `createdAt` even
/// if the wall clock stepped backwards.
pub(crate) fn stamp_updated_at(row: &mut JsonMap) -> AppResult<()> {
    let mut now = Utc::now();
    if let Some(created) = row
        .get("createdAt")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        let created = created.with_timezone(&Utc);
        if now < created {
            now = created;
        }
    }
    row.insert("updatedAt".into(), serde_json::to_value(now)?);
    Ok(())
}

fn parse_rows(key: &str, text: &str) -> AppResult<Rows> {
    serde_json::from_str::<Rows>(text).map_err(|e| {
        AppError::corrupt("bad_collection".to_string(), format!("collection '{}': {}", key, e))
    })
}

impl Store {
    /// Decoded rows for a collection key, cache-aware. An absent slot decodes
    /// to an empty sequence; a present but unparsable slot is a fault.
    pub(crate) fn read_rows(&self, key: &str) -> AppResult<Arc<Rows>> {
        if let Some(rows) = self.cache().read().get(key) {
            return Ok(rows.clone());
        }
        let rows = match self.medium().get(key)? {
            Some(text) => parse_rows(key, &text)?,
            None => Vec::new(),
        };
        let rows = Arc::new(rows);
        self.cache().write().insert(key.to_string(), rows.clone());
        Ok(rows)
    }

    /// Persist a whole collection and replace its cache entry.
    pub(crate) fn write_rows(&self, key: &str, rows: Rows) -> AppResult<()> {
        let text = serde_json::to_string(&rows)?;
        self.medium().set(key, &text)?;
        self.cache().write().insert(key.to_string(), Arc::new(rows));
        Ok(())
    }

    /// All rows of a collection in insertion order; empty if absent.
    pub fn list_raw(&self, key: &str) -> AppResult<Vec<JsonMap>> {
        Ok((*self.read_rows(key)?).clone())
    }

    /// Linear lookup by `_id`; first match wins (uniqueness is assumed, not
    /// enforced).
    pub fn get_raw(&self, key: &str, id: &str) -> AppResult<Option<JsonMap>> {
        Ok(self.read_rows(key)?.iter().find(|r| row_id(r) == Some(id)).cloned())
    }

    /// Append a row: a caller-supplied `_id` is honored at creation, else one
    /// is generated; `createdAt` is preserved if already present in the
    /// input; `updatedAt` is always set to now.
    pub fn add_raw(&self, key: &str, mut row: JsonMap) -> AppResult<JsonMap> {
        let mut rows = (*self.read_rows(key)?).clone();
        if !row.get("_id").map(|v| v.is_string()).unwrap_or(false) {
            row.insert("_id".into(), JsonValue::String(crate::ident::generate_id()));
        }
        if !row.contains_key("createdAt") {
            row.insert("createdAt".into(), serde_json::to_value(Utc::now())?);
        }
        stamp_updated_at(&mut row)?;
        debug!(target: "tradepost::storage", "add: key='{}' id={:?}", key, row_id(&row));
        rows.push(row.clone());
        self.write_rows(key, rows)?;
        Ok(row)
    }

    /// Shallow-merge a patch over the row with matching `_id`. Returns the
    /// updated row, or `None` (and no change) when the id is absent.
    pub fn update_raw(&self, key: &str, id: &str, patch: JsonMap) -> AppResult<Option<JsonMap>> {
        let mut rows = (*self.read_rows(key)?).clone();
        let Some(idx) = rows.iter().position(|r| row_id(r) == Some(id)) else {
            return Ok(None);
        };
        merge_patch(&mut rows[idx], patch);
        stamp_updated_at(&mut rows[idx])?;
        let updated = rows[idx].clone();
        debug!(target: "tradepost::storage", "update: key='{}' id='{}'", key, id);
        self.write_rows(key, rows)?;
        Ok(Some(updated))
    }

    /// Remove the row with matching `_id` if present and persist the rest.
    /// The result reports whether a row was actually removed; callers must
    /// treat it as "operation completed", not a prior-existence guarantee.
    /// Deleting twice never faults.
    pub fn delete_raw(&self, key: &str, id: &str) -> AppResult<bool> {
        let mut rows = (*self.read_rows(key)?).clone();
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        let removed = rows.len() != before;
        debug!(target: "tradepost::storage", "delete: key='{}' id='{}' removed={}", key, id, removed);
        self.write_rows(key, rows)?;
        Ok(removed)
    }
}
