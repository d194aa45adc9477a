use crate::error::CatalogError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

const ENV_KEYS: &[&str] = &[
    "SQLITE_PATH",
    "D1_ACCOUNT_ID",
    "D1_DATABASE_ID",
    "CLOUDFLARE_API_TOKEN",
    "YOUTUBE_API_KEY",
    "IGDB_CLIENT_ID",
    "IGDB_CLIENT_SECRET",
    "WEB_ROOT",
    "SYNC_INTERVAL_MINUTES",
];

/// Application configuration, read from the environment via Figment.
/// Either `SQLITE_PATH` or the full D1 credential set must be present.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub sqlite_path: Option<String>,
    pub d1_account_id: Option<String>,
    pub d1_database_id: Option<String>,
    pub cloudflare_api_token: Option<String>,
    pub youtube_api_key: Option<String>,
    pub igdb_client_id: Option<String>,
    pub igdb_client_secret: Option<String>,

    /// Directory holding the bundled front end. Default: `web/public`.
    pub web_root: Option<String>,

    /// Minutes between scheduled ingestion runs; 0 or unset disables them.
    pub sync_interval_minutes: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Embedded {
        path: String,
    },
    Remote {
        account_id: String,
        database_id: String,
        api_token: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, CatalogError> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| CatalogError::UnexpectedError(format!("failed to read environment: {e}")))
    }

    /// Resolve which storage backend the environment selects. The embedded
    /// path wins when both sets are present.
    pub fn storage_backend(&self) -> Result<StorageBackend, CatalogError> {
        if let Some(path) = self.sqlite_path.as_ref().filter(|p| !p.is_empty()) {
            return Ok(StorageBackend::Embedded { path: path.clone() });
        }

        match (
            non_empty(self.d1_account_id.as_deref()),
            non_empty(self.d1_database_id.as_deref()),
            non_empty(self.cloudflare_api_token.as_deref()),
        ) {
            (Some(account_id), Some(database_id), Some(api_token)) => {
                Ok(StorageBackend::Remote {
                    account_id: account_id.to_string(),
                    database_id: database_id.to_string(),
                    api_token: api_token.to_string(),
                })
            }
            _ => Err(CatalogError::MissingConfig(
                "SQLITE_PATH or D1_ACCOUNT_ID/D1_DATABASE_ID/CLOUDFLARE_API_TOKEN",
            )),
        }
    }

    pub fn igdb_credentials(&self) -> Result<(String, String), CatalogError> {
        let client_id =
            non_empty(self.igdb_client_id.as_deref()).ok_or(CatalogError::MissingConfig("IGDB_CLIENT_ID"))?;
        let client_secret = non_empty(self.igdb_client_secret.as_deref())
            .ok_or(CatalogError::MissingConfig("IGDB_CLIENT_SECRET"))?;
        Ok((client_id.to_string(), client_secret.to_string()))
    }

    pub fn web_root(&self) -> &str {
        non_empty(self.web_root.as_deref()).unwrap_or("web/public")
    }

    pub fn sync_interval_minutes(&self) -> Option<u64> {
        self.sync_interval_minutes.filter(|m| *m > 0)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Shorten a secret for startup logging.
pub fn mask_token(token: &str) -> String {
    if token.len() < 8 {
        return "***".to_string();
    }
    format!("{}...{}", &token[..4], &token[token.len() - 4..])
}
