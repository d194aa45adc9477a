//! Wire and entity records shared by the repository and the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde adapter for the canonical `YYYY-MM-DD HH:MM:SS` (UTC) timestamp
/// form, the single exchange format on the wire and in storage.
pub mod datetime_format {
    use crate::storage::DATETIME_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(DATETIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response envelope: `meta` is present exactly when the handler produced
/// pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    pub fn paginated(data: T, meta: Meta) -> Self {
        Self {
            data,
            meta: Some(meta),
        }
    }
}

/// Insert payload for a video; the repository stamps `created_at` and
/// `updated_at` itself. The id is the upstream video id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub published_at: DateTime<Utc>,
    pub game_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    #[serde(with = "datetime_format")]
    pub published_at: DateTime<Utc>,
    pub game: Option<GameInfo>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// The subset of a game that rides along on a video row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameInfo {
    pub id: String,
    pub app_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: String,
    pub app_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub logo: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVideoGameRequest {
    pub game_id: String,
}

/// Counters produced by one ingestion run. Serialized with `total` carrying
/// the fetched-item count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStats {
    pub added: u32,
    pub skipped: u32,
    pub errors: u32,
    #[serde(rename = "total")]
    pub total_fetched: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(with = "datetime_format")]
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub uptime: String,
}

/// One entry of the Steam community app search, proxied verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteamAppSearchResult {
    pub appid: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub logo: String,
}
