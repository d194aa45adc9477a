use crate::igdb::IgdbClient;
use crate::repository::Repository;
use crate::server::routes::{docs, games, health, videos};
use crate::youtube::YoutubeClient;

use axum::{
    Router,
    extract::Request,
    http::header::USER_AGENT,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub igdb: Arc<IgdbClient>,
    pub youtube: Arc<YoutubeClient>,
    /// General-purpose client for upstreams without a dedicated wrapper
    /// (the Steam proxy lookup).
    pub http: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        igdb: Arc<IgdbClient>,
        youtube: Arc<YoutubeClient>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("failed to build reqwest client");

        Self {
            repo,
            igdb,
            youtube,
            http,
            started_at: Instant::now(),
        }
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let resp = next.run(req).await;

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        error!(
            "| {:>3} | {:^7} | {} | {}ms | {}",
            status.as_u16(),
            method.as_str(),
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {:^7} | {} | {}ms | {}",
            status.as_u16(),
            method.as_str(),
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {:^7} | {} | {}ms | {}",
            status.as_u16(),
            method.as_str(),
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn catalog_router(state: AppState, web_root: &Path) -> Router {
    let api = Router::new()
        .route("/databasez", get(health::database_health))
        .route("/videos", get(videos::list_videos))
        .route("/videos/sync", post(videos::sync_videos))
        .route("/videos/{id}", get(videos::get_video))
        .route("/videos/{id}/game", put(videos::update_video_game))
        .route("/games", get(games::list_games).post(games::create_game))
        .route("/games/{id}", get(games::get_game))
        .route("/games/igdb/search", get(games::search_igdb))
        .route("/games/steam/search", get(games::search_steam))
        .route("/swagger", get(docs::swagger_ui))
        .route("/swagger/", get(docs::swagger_ui))
        .route("/swagger/doc.json", get(docs::openapi_doc));

    // Anything outside /api falls through to the bundled front end; unknown
    // paths get the SPA's 404 page.
    let spa = ServeDir::new(web_root)
        .not_found_service(ServeFile::new(web_root.join("404.html")));

    Router::new()
        .nest("/api", api)
        .fallback_service(spa)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
        .layer(CorsLayer::permissive())
}
