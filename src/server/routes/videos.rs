use super::{ListQuery, bad_body, bad_query};
use crate::error::CatalogError;
use crate::model::{ApiResponse, Meta, SyncStats, UpdateVideoGameRequest, VideoResponse};
use crate::server::router::AppState;
use crate::sync;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

pub async fn list_videos(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<VideoResponse>>>, CatalogError> {
    let Query(query) = query.map_err(bad_query)?;
    let page = query.page();

    let videos = state.repo.list_videos(page, &query.search).await?;
    let total = state.repo.count_videos(&query.search).await?;

    let meta = Meta {
        total,
        limit: page.limit,
        offset: page.offset,
    };
    Ok(Json(ApiResponse::paginated(videos, meta)))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VideoResponse>>, CatalogError> {
    let video = state.repo.get_video(&id).await?;
    Ok(Json(ApiResponse::new(video)))
}

pub async fn update_video_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateVideoGameRequest>, JsonRejection>,
) -> Result<StatusCode, CatalogError> {
    let Json(request) = body.map_err(bad_body)?;

    state.repo.update_video_game(&id, &request.game_id).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    sync::DEFAULT_MAX_RESULTS
}

pub async fn sync_videos(
    State(state): State<AppState>,
    query: Result<Query<SyncQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SyncStats>>, CatalogError> {
    let Query(query) = query.map_err(bad_query)?;

    let stats =
        sync::sync_channel_videos(&state.repo, &state.youtube, query.max_results).await?;
    Ok(Json(ApiResponse::new(stats)))
}
