use super::{ListQuery, bad_body, bad_query};
use crate::error::CatalogError;
use crate::igdb::GameSearchResult;
use crate::model::{ApiResponse, CreateGameRequest, Game, Meta, SteamAppSearchResult};
use crate::server::router::AppState;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

const STEAM_SEARCH_URL: &str = "https://steamcommunity.com/actions/SearchApps";

pub async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Game>>>, CatalogError> {
    let Query(query) = query.map_err(bad_query)?;
    let page = query.page();

    let games = state.repo.list_games(page, &query.search).await?;
    let total = state.repo.count_games(&query.search).await?;

    let meta = Meta {
        total,
        limit: page.limit,
        offset: page.offset,
    };
    Ok(Json(ApiResponse::paginated(games, meta)))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Game>>, CatalogError> {
    let game = state.repo.get_game(&id).await?;
    Ok(Json(ApiResponse::new(game)))
}

pub async fn create_game(
    State(state): State<AppState>,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<axum::response::Response, CatalogError> {
    let Json(request) = body.map_err(bad_body)?;

    // A game already catalogued under the same store id is returned as-is.
    if let Some(app_id) = request.app_id.as_deref() {
        if let Some(existing) = state.repo.get_game_by_app_id(app_id).await? {
            return Ok(Json(ApiResponse::new(existing)).into_response());
        }
    }

    let game = state.repo.create_game(&request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(game))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search_igdb(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<GameSearchResult>>>, CatalogError> {
    let Query(query) = query.map_err(bad_query)?;
    if query.q.is_empty() {
        return Err(CatalogError::BadInput(
            "query parameter 'q' is required".to_string(),
        ));
    }

    let results = state.igdb.search(&query.q).await?;
    Ok(Json(ApiResponse::new(results)))
}

pub async fn search_steam(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<SteamAppSearchResult>>>, CatalogError> {
    let Query(query) = query.map_err(bad_query)?;
    if query.q.is_empty() {
        return Err(CatalogError::BadInput(
            "query parameter 'q' is required".to_string(),
        ));
    }

    let mut url = reqwest::Url::parse(STEAM_SEARCH_URL)
        .map_err(|e| CatalogError::UnexpectedError(format!("bad steam url: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| CatalogError::UnexpectedError("bad steam url".to_string()))?
        .push(&query.q);

    let response = state.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::UpstreamFailed { status, body });
    }

    let results: Vec<SteamAppSearchResult> = response.json().await?;
    Ok(Json(ApiResponse::new(results)))
}
