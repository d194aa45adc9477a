use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    QueryFailed(String),

    #[error("transactions not supported with D1 REST API")]
    TransactionsUnsupported,

    #[error("upstream request failed with status {status}: {body}")]
    UpstreamFailed { status: StatusCode, body: String },

    #[error("token request failed: {0}")]
    Unauthenticated(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0} environment variable is required")]
    MissingConfig(&'static str),

    #[error("unexpected error: {0}")]
    UnexpectedError(String),
}

impl CatalogError {
    /// Prefix an error with the repository operation that produced it.
    ///
    /// `NotFound` survives unwrapped so handlers that check for it explicitly
    /// still can; everything else collapses into a diagnostic `QueryFailed`.
    pub fn with_op(self, op: &str) -> Self {
        match self {
            CatalogError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::QueryFailed(format!("{op}: {other}")),
        }
    }
}

/// Wire shape for every error response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            CatalogError::BadInput(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::BackendUnavailable(_)
            | CatalogError::QueryFailed(_)
            | CatalogError::TransactionsUnsupported
            | CatalogError::UpstreamFailed { .. }
            | CatalogError::Unauthenticated(_)
            | CatalogError::ReqwestError(_)
            | CatalogError::JsonError(_)
            | CatalogError::DatabaseError(_)
            | CatalogError::MissingConfig(_)
            | CatalogError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
