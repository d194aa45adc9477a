//! IGDB search client with a cached client-credentials token.

use crate::error::CatalogError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const API_URL: &str = "https://api.igdb.com/v4/games";

/// Tokens are retired five minutes before their real expiry so no request
/// ever carries one inside that window.
const EXPIRY_MARGIN_SECS: i64 = 5 * 60;

const HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSearchResult {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

pub struct IgdbClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_url: String,
    token: RwLock<Option<CachedToken>>,
}

impl IgdbClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            client_id,
            client_secret,
            token_url: TOKEN_URL.to_string(),
            api_url: API_URL.to_string(),
            token: RwLock::new(None),
        }
    }

    /// Point the client at different endpoints. Used by tests.
    pub fn with_endpoints(mut self, token_url: String, api_url: String) -> Self {
        self.token_url = token_url;
        self.api_url = api_url;
        self
    }

    /// Search IGDB by name, returning main games only.
    ///
    /// The query is interpolated verbatim into the IGDB query body; callers
    /// must not embed unescaped `"`.
    pub async fn search(&self, query: &str) -> Result<Vec<GameSearchResult>, CatalogError> {
        let access_token = self.ensure_valid_token().await?;

        let body = format!(r#"search "{query}"; fields name,url; where game_type = 0;"#);

        let response = self
            .client
            .post(&self.api_url)
            .header("Client-ID", &self.client_id)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::UpstreamFailed { status, body });
        }

        let results: Vec<GameSearchResult> = response.json().await?;
        Ok(results)
    }

    /// Hand out a token that is valid for at least the expiry margin.
    ///
    /// The freshness check holds the read lock; a stale cache escalates to
    /// the write lock and rechecks, so concurrent callers racing into the
    /// refresh path coalesce onto a single token request.
    async fn ensure_valid_token(&self) -> Result<String, CatalogError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch_access_token().await?;
        let access_token = token.access_token.clone();
        debug!(expires_at = %token.expires_at, "IGDB access token refreshed");
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_access_token(&self) -> Result<CachedToken, CatalogError> {
        let url = format!(
            "{}?client_id={}&client_secret={}&grant_type=client_credentials",
            self.token_url, self.client_id, self.client_secret
        );

        let response = self.client.post(url).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Unauthenticated(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in)
                - Duration::seconds(EXPIRY_MARGIN_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_inside_expiry_margin_is_stale() {
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!token.is_fresh());

        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: Utc::now() + Duration::seconds(60),
        };
        assert!(token.is_fresh());
    }
}
