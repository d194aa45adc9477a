//! Minimal YouTube Data API v3 client: channel lookup and playlist paging,
//! the two calls ingestion needs.

use crate::error::CatalogError;
use serde::Deserialize;

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The upstream maximum page size for playlistItems.list.
pub const MAX_PAGE_SIZE: u32 = 50;

pub struct YoutubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            api_key,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Resolve the channel's "uploads" playlist id.
    pub async fn channel_uploads_playlist(&self, channel_id: &str) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(format!("{}/channels", self.base_url))
            .query(&[
                ("part", "contentDetails"),
                ("id", channel_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_failed(response).await);
        }

        let body: ChannelListResponse = response.json().await?;
        body.items
            .into_iter()
            .next()
            .map(|channel| channel.content_details.related_playlists.uploads)
            .ok_or_else(|| CatalogError::NotFound("channel".to_string()))
    }

    /// Fetch one page of playlist items, newest first.
    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemsPage, CatalogError> {
        let max_results = MAX_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .client
            .get(format!("{}/playlistItems", self.base_url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_failed(response).await);
        }

        let page: PlaylistItemsPage = response.json().await?;
        Ok(page)
    }
}

async fn upstream_failed(response: reqwest::Response) -> CatalogError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    CatalogError::UpstreamFailed { status, body }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemsPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: String,
    pub resource_id: ResourceId,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub video_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub maxres: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Highest-resolution thumbnail url, if the item carries any.
    pub fn best_url(&self) -> Option<String> {
        [
            &self.maxres,
            &self.standard,
            &self.high,
            &self.medium,
            &self.default,
        ]
        .into_iter()
        .find_map(|t| t.as_ref().map(|t| t.url.clone()))
    }
}
