use crate::error::CatalogError;
use crate::storage::schema::SQLITE_INIT;
use crate::storage::{ExecResult, Row, SqlValue, Storage, format_datetime};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::info;

/// File-backed SQLite backend. Parameters bind natively; values round-trip
/// through the canonical timestamp text, so reads need no normalization.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn open(path: &str) -> Result<Self, CatalogError> {
        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| CatalogError::BackendUnavailable(format!("db connect failed: {e}")))?;

        apply_schema(&pool).await?;

        info!(path, "SQLite storage initialized");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| CatalogError::BackendUnavailable(e.to_string()))
    }

    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, CatalogError> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_value(query, arg);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, CatalogError> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_value(query, arg);
        }

        let result = query.execute(&self.pool).await?;
        Ok(ExecResult {
            last_insert_id: result.last_insert_rowid(),
            rows_affected: result.rows_affected(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: SqliteQuery<'q>, arg: &'q SqlValue) -> SqliteQuery<'q> {
    match arg {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Timestamp(t) => query.bind(format_datetime(*t)),
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row, CatalogError> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => Value::from(row.try_get::<f64, _>(index)?),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), CatalogError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
