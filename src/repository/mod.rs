//! Entity-level persistence on top of the storage adapter.
//!
//! Layout:
//! - `videos.rs`: video listing, lookup, insert, game linking
//! - `games.rs`: game listing, lookup, insert

mod games;
mod videos;

use crate::error::CatalogError;
use crate::storage::{DATETIME_FORMAT, Row, Storage};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

const DEFAULT_LIMIT: i64 = 20;

/// Pagination window, clamped non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.max(0),
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

pub struct Repository {
    storage: Arc<dyn Storage>,
}

impl Repository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub(crate) fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.storage.ping().await
    }
}

/// `%search%` pattern for the case-insensitive filters. The embedded engine
/// has no ILIKE operator, so both sides are lowered around a plain LIKE.
pub(crate) fn like_pattern(search: &str) -> String {
    format!("%{search}%")
}

pub(crate) fn row_str(row: &Row, key: &str) -> Result<String, CatalogError> {
    row.get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::UnexpectedError(format!("missing column {key}")))
}

pub(crate) fn row_opt_str(row: &Row, key: &str) -> Option<String> {
    row.get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

pub(crate) fn row_i64(row: &Row, key: &str) -> Result<i64, CatalogError> {
    let value = row
        .get(key)
        .ok_or_else(|| CatalogError::UnexpectedError(format!("missing column {key}")))?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .ok_or_else(|| CatalogError::UnexpectedError(format!("column {key} is not a number")))
}

pub(crate) fn row_datetime(row: &Row, key: &str) -> Result<DateTime<Utc>, CatalogError> {
    let raw = row_str(row, key)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| CatalogError::UnexpectedError(format!("column {key}: bad timestamp {raw:?}: {e}")))
}
