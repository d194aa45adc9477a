use crate::error::CatalogError;
use crate::storage::{
    DATE_FORMAT, DATETIME_FORMAT, ExecResult, Row, SqlValue, Storage, format_datetime,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Prepended to every write so foreign-key checks defer to the end of the
/// statement batch. Only effective when sent in the same request as the write.
const DEFER_FOREIGN_KEYS: &str = "PRAGMA defer_foreign_keys = on; ";

/// Cloudflare D1 REST backend. One SQL statement per HTTP call; the protocol
/// rejects bound parameters when statements are batched, so writes inline
/// their arguments into the statement text. Transactions are not supported.
pub struct D1Storage {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl D1Storage {
    pub fn new(account_id: String, database_id: String, api_token: String) -> Self {
        Self::with_base_url(API_BASE_URL, &account_id, &database_id, api_token)
    }

    /// Point the backend at a different API host. Used by tests.
    pub fn with_base_url(
        base_url: &str,
        account_id: &str,
        database_id: &str,
        api_token: String,
    ) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("failed to build reqwest client");
        let endpoint =
            format!("{base_url}/accounts/{account_id}/d1/database/{database_id}/query");
        Self {
            client,
            endpoint,
            api_token,
        }
    }

    /// The REST protocol cannot span statements, so transactions are
    /// rejected outright; callers needing them must use the embedded
    /// backend.
    pub fn begin(&self) -> Result<(), CatalogError> {
        Err(CatalogError::TransactionsUnsupported)
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<D1ResultEntry, CatalogError> {
        let (final_sql, params) = prepare_statement(sql, args);

        let request = D1QueryRequest {
            sql: &final_sql,
            params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| CatalogError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::BackendUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(CatalogError::QueryFailed(format!(
                "D1 request failed with status {status}: {body}"
            )));
        }

        let mut envelope: D1Envelope = serde_json::from_str(&body)
            .map_err(|e| CatalogError::QueryFailed(format!("malformed D1 response: {e}")))?;

        // The last entry belongs to the caller's statement; any prepended
        // PRAGMA produces its own entry before it.
        let Some(entry) = envelope.result.pop() else {
            return Err(CatalogError::QueryFailed(
                "no results returned from D1".to_string(),
            ));
        };

        if !entry.success {
            let message = envelope
                .errors
                .into_iter()
                .next()
                .map_or_else(|| "D1 query failed".to_string(), |e| e.message);
            return Err(CatalogError::QueryFailed(message));
        }

        Ok(entry)
    }
}

#[async_trait]
impl Storage for D1Storage {
    async fn ping(&self) -> Result<(), CatalogError> {
        self.execute("SELECT 1", &[])
            .await
            .map(|_| ())
            .map_err(|e| CatalogError::BackendUnavailable(e.to_string()))
    }

    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, CatalogError> {
        let entry = self.execute(sql, args).await?;
        Ok(entry.results.into_iter().map(normalize_row).collect())
    }

    async fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, CatalogError> {
        let entry = self.execute(sql, args).await?;
        Ok(ExecResult {
            last_insert_id: entry.meta.last_row_id as i64,
            rows_affected: entry.meta.changes as u64,
        })
    }

    async fn close(&self) {}
}

#[derive(Serialize)]
struct D1QueryRequest<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct D1Envelope {
    #[serde(default)]
    result: Vec<D1ResultEntry>,
    #[serde(default)]
    errors: Vec<D1ApiMessage>,
}

#[derive(Deserialize)]
struct D1ApiMessage {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct D1ResultEntry {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    meta: D1Meta,
    #[serde(default)]
    results: Vec<Row>,
}

#[derive(Deserialize, Default)]
struct D1Meta {
    #[serde(default)]
    changes: f64,
    #[serde(default)]
    last_row_id: f64,
}

/// Writes inline their arguments (the protocol rejects bound parameters in a
/// statement batch) and carry the foreign-key pragma; reads keep `?`
/// placeholders with arguments shipped as a string array.
fn prepare_statement(sql: &str, args: &[SqlValue]) -> (String, Option<Vec<String>>) {
    if is_write_statement(sql) {
        let inlined = format!("{DEFER_FOREIGN_KEYS}{}", inline_params(sql, args));
        (inlined, None)
    } else {
        let params = args.iter().map(param_value).collect();
        (sql.to_string(), Some(params))
    }
}

/// A statement is a write iff its first non-whitespace keyword is
/// INSERT, UPDATE, or DELETE (case-insensitive).
pub(crate) fn is_write_statement(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    ["INSERT", "UPDATE", "DELETE"]
        .iter()
        .any(|kw| upper.starts_with(kw))
}

/// Substitute `?` placeholders left to right with SQL literals.
pub(crate) fn inline_params(sql: &str, args: &[SqlValue]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    for arg in args {
        match rest.find('?') {
            Some(index) => {
                out.push_str(&rest[..index]);
                out.push_str(&inline_value(arg));
                rest = &rest[index + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn inline_value(arg: &SqlValue) -> String {
    match arg {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        SqlValue::Text(s) => quote_string(s),
        SqlValue::Timestamp(t) => format!("'{}'", format_datetime(*t)),
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Printable form for read-side parameter arrays.
fn param_value(arg: &SqlValue) -> String {
    match arg {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Timestamp(t) => format_datetime(*t),
    }
}

fn normalize_row(mut row: Row) -> Row {
    for value in row.values_mut() {
        if let Value::String(s) = value {
            let normalized = normalize_datetime(s);
            if normalized != *s {
                *value = Value::String(normalized);
            }
        }
    }
    row
}

/// Rewrite any recognized timestamp string to the canonical
/// `YYYY-MM-DD HH:MM:SS` form. Non-timestamp strings pass through verbatim,
/// and canonical input is a fixed point.
pub(crate) fn normalize_datetime(raw: &str) -> String {
    let cleaned = strip_monotonic_clock(raw);

    if NaiveDateTime::parse_from_str(cleaned, DATETIME_FORMAT).is_ok()
        || NaiveDate::parse_from_str(cleaned, DATE_FORMAT).is_ok()
    {
        return cleaned.to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return dt.naive_local().format(DATETIME_FORMAT).to_string();
    }

    if let Some(naive) = parse_offset_datetime(cleaned) {
        return naive.format(DATETIME_FORMAT).to_string();
    }

    raw.to_string()
}

/// Parse the ambient runtime's default timestamp print form:
/// `YYYY-MM-DD HH:MM:SS[.fraction] -0700 [zone]`. The trailing zone
/// abbreviation carries no extra information and is ignored.
fn parse_offset_datetime(s: &str) -> Option<NaiveDateTime> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let candidate = format!("{} {} {}", parts[0], parts[1], parts[2]);
    DateTime::parse_from_str(&candidate, "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .map(|dt| dt.naive_local())
}

/// Drop the ` m=...` monotonic-clock suffix the runtime appends when a
/// timestamp value is printed rather than formatted.
fn strip_monotonic_clock(s: &str) -> &str {
    match s.find(" m=") {
        Some(index) if index > 0 => &s[..index],
        _ => s,
    }
}
