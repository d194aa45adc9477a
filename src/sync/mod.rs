//! Channel ingestion: upsert recent uploads into the video store.
//!
//! The HTTP-triggered and scheduled paths both run [`sync_channel_videos`];
//! the stats record travels through the run by reference and is never
//! promoted to shared state.

use crate::error::CatalogError;
use crate::model::{NewVideo, SyncStats};
use crate::repository::Repository;
use crate::youtube::{PlaylistItem, YoutubeClient};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The channel whose uploads feed the catalog.
pub const CHANNEL_ID: &str = "UCsGx1qSnAS2P1YCJPYnYVUg";

pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Fetch up to `max_results` recent uploads and insert the ones the store
/// has not seen. Skip-if-exists makes the run idempotent; per-item failures
/// are counted, not fatal.
pub async fn sync_channel_videos(
    repo: &Repository,
    youtube: &YoutubeClient,
    max_results: u32,
) -> Result<SyncStats, CatalogError> {
    let playlist_id = youtube.channel_uploads_playlist(CHANNEL_ID).await?;

    let mut stats = SyncStats::default();
    let mut page_token: Option<String> = None;

    while stats.total_fetched < max_results {
        let page = youtube
            .playlist_items(&playlist_id, page_token.as_deref())
            .await?;

        if page.items.is_empty() {
            break;
        }

        for item in &page.items {
            if stats.total_fetched >= max_results {
                break;
            }
            stats.total_fetched += 1;

            process_item(repo, item, &mut stats).await;
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(stats)
}

async fn process_item(repo: &Repository, item: &PlaylistItem, stats: &mut SyncStats) {
    let video_id = item.snippet.resource_id.video_id.as_str();

    if matches!(
        repo.get_video_by_external_id(video_id).await,
        Ok(Some(_))
    ) {
        stats.skipped += 1;
        return;
    }

    let video = build_video(item);
    match repo.create_video(&video).await {
        Ok(()) => stats.added += 1,
        Err(err) => {
            warn!(video_id, error = %err, "failed to insert video");
            stats.errors += 1;
        }
    }
}

fn build_video(item: &PlaylistItem) -> NewVideo {
    let snippet = &item.snippet;

    let published_at = match DateTime::parse_from_rfc3339(&snippet.published_at) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(
                raw = %snippet.published_at,
                error = %err,
                "unparseable publish date, falling back to now"
            );
            Utc::now()
        }
    };

    NewVideo {
        id: snippet.resource_id.video_id.clone(),
        title: snippet.title.clone(),
        thumbnail: snippet.thumbnails.best_url(),
        published_at,
        game_id: None,
    }
}

/// Headless ingestion loop. Runs until the process stops; outcomes are
/// logged, never returned.
pub async fn run_scheduled(repo: Arc<Repository>, youtube: Arc<YoutubeClient>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // An interval's first tick fires immediately; the first real run waits
    // one full period.
    ticker.tick().await;

    info!(every_secs = every.as_secs(), "scheduled YouTube sync enabled");
    loop {
        ticker.tick().await;
        match sync_channel_videos(&repo, &youtube, DEFAULT_MAX_RESULTS).await {
            Ok(stats) => info!(
                added = stats.added,
                skipped = stats.skipped,
                errors = stats.errors,
                total = stats.total_fetched,
                "scheduled sync completed"
            ),
            Err(err) => warn!(error = %err, "scheduled sync failed"),
        }
    }
}
