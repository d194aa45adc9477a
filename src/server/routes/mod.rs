pub mod docs;
pub mod games;
pub mod health;
pub mod videos;

use crate::error::CatalogError;
use crate::repository::Page;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use serde::Deserialize;

pub(crate) const ERR_INVALID_REQUEST_BODY: &str = "invalid request body";

/// Pagination and search query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub search: String,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

fn default_limit() -> i64 {
    20
}

pub(crate) fn bad_query(rejection: QueryRejection) -> CatalogError {
    CatalogError::BadInput(rejection.to_string())
}

pub(crate) fn bad_body(_rejection: JsonRejection) -> CatalogError {
    CatalogError::BadInput(ERR_INVALID_REQUEST_BODY.to_string())
}
