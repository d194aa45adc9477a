//! Storage adapter: one row-oriented query surface, two backends.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the embedded database
//! - `sqlite.rs`: file-backed SQLite backend (sqlx pool)
//! - `d1.rs`: Cloudflare D1 REST backend (one statement per HTTP call)

pub mod d1;
pub mod schema;
pub mod sqlite;

pub use d1::D1Storage;
pub use sqlite::SqliteStorage;

use crate::config::{Config, StorageBackend};
use crate::error::CatalogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// The single exchange format for timestamps between the core and its storage.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// A typed positional argument for a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row: column name -> JSON value, as both backends produce it.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

/// Uniform read/write contract over the embedded and remote backends.
///
/// All writes are single statements; neither backend offers transactions
/// through this surface (the D1 REST protocol rejects them outright).
#[async_trait]
pub trait Storage: Send + Sync {
    async fn ping(&self) -> Result<(), CatalogError>;

    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, CatalogError>;

    async fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, CatalogError>;

    async fn close(&self);
}

/// Select and open the backend the configuration asks for.
pub async fn connect(cfg: &Config) -> Result<Arc<dyn Storage>, CatalogError> {
    match cfg.storage_backend()? {
        StorageBackend::Embedded { path } => {
            let storage = SqliteStorage::open(&path).await?;
            info!(path = %path, "using embedded SQLite backend");
            Ok(Arc::new(storage))
        }
        StorageBackend::Remote {
            account_id,
            database_id,
            api_token,
        } => {
            let storage = D1Storage::new(account_id.clone(), database_id.clone(), api_token);
            storage.ping().await?;
            info!(account_id = %account_id, database_id = %database_id, "using Cloudflare D1 backend");
            Ok(Arc::new(storage))
        }
    }
}
