use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use opztv_catalog::igdb::IgdbClient;
use opztv_catalog::model::NewVideo;
use opztv_catalog::repository::Repository;
use opztv_catalog::server::router::{AppState, catalog_router};
use opztv_catalog::storage::SqliteStorage;
use opztv_catalog::youtube::YoutubeClient;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "opztv-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    path
}

async fn test_app(tag: &str) -> (Router, Arc<Repository>) {
    let path = temp_db_path(tag);
    let storage = SqliteStorage::open(path.to_str().unwrap()).await.unwrap();
    let repo = Arc::new(Repository::new(Arc::new(storage)));

    let igdb = Arc::new(
        IgdbClient::new("client".to_string(), "secret".to_string()).with_endpoints(
            "http://127.0.0.1:9/oauth2/token".to_string(),
            "http://127.0.0.1:9/games".to_string(),
        ),
    );
    let youtube = Arc::new(
        YoutubeClient::new("key".to_string()).with_base_url("http://127.0.0.1:9".to_string()),
    );

    let state = AppState::new(repo.clone(), igdb, youtube);
    let app = catalog_router(state, &std::env::temp_dir().join("opztv-missing-webroot"));
    (app, repo)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn seed_video(id: &str) -> NewVideo {
    NewVideo {
        id: id.to_string(),
        title: "Speedrun attempt".to_string(),
        thumbnail: None,
        published_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
        game_id: None,
    }
}

#[tokio::test]
async fn linking_a_game_refreshes_updated_at() {
    let (app, repo) = test_app("link-game").await;

    repo.create_video(&seed_video("vid-1")).await.unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/games")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"Celeste"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let game = body_json(resp).await;
    let game_id = game["data"]["id"].as_str().unwrap().to_string();

    // Timestamps carry second precision; make sure the update lands in a
    // later second than the insert.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/videos/vid-1/game")
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"game_id":"{game_id}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos/vid-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let data = &body["data"];
    assert_eq!(data["game"]["id"].as_str().unwrap(), game_id);
    assert_eq!(data["game"]["name"], "Celeste");

    let created_at = data["created_at"].as_str().unwrap();
    let updated_at = data["updated_at"].as_str().unwrap();
    // Canonical timestamps sort lexicographically.
    assert!(updated_at > created_at, "{updated_at} vs {created_at}");

    // One-item responses carry no pagination metadata.
    assert!(body.get("meta").is_none());
}

#[tokio::test]
async fn list_videos_carries_meta_and_single_get_does_not() {
    let (app, repo) = test_app("video-envelope").await;

    repo.create_video(&seed_video("vid-1")).await.unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["limit"], 20);
    assert!(body["data"][0]["game"].is_null());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos/vid-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert!(body.get("meta").is_none());
}

#[tokio::test]
async fn unknown_video_reads_surface_as_storage_failures() {
    let (app, _repo) = test_app("video-missing").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos/no-such-video")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Linking against an unknown video is checked explicitly.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/videos/no-such-video/game")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"game_id":"g-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_pagination_query_is_a_bad_request() {
    let (app, _repo) = test_app("video-badquery").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos?limit=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_reports_healthy_database() {
    let (app, _repo) = test_app("health").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/databasez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");
    assert!(body["uptime"].is_string());
    assert!(body["timestamp"].is_string());
}
