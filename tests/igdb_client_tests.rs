use axum::{Json, Router, routing::post};
use opztv_catalog::CatalogError;
use opztv_catalog::igdb::IgdbClient;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Token endpoint that hands out an already-expired token first (its
/// lifetime is shorter than the five-minute safety margin) and long-lived
/// tokens afterwards, counting every request.
fn token_route(counter: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/oauth2/token",
        post(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let expires_in = if n == 0 { 1 } else { 3600 };
                Json(json!({
                    "access_token": format!("tok-{n}"),
                    "expires_in": expires_in,
                    "token_type": "bearer"
                }))
            }
        }),
    )
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
    let token_posts = Arc::new(AtomicUsize::new(0));
    let search_bodies: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let bodies = search_bodies.clone();
    let app = token_route(token_posts.clone()).route(
        "/games",
        post(move |body: String| {
            let bodies = bodies.clone();
            async move {
                bodies.lock().await.push(body);
                Json(json!([
                    {"id": 1, "name": "Celeste", "url": "https://www.igdb.com/games/celeste"}
                ]))
            }
        }),
    );
    let base_url = spawn_server(app).await;

    let client = IgdbClient::new("client".to_string(), "secret".to_string()).with_endpoints(
        format!("{base_url}/oauth2/token"),
        format!("{base_url}/games"),
    );

    // Primes the cache with the short-lived (already stale) token.
    let results = client.search("x").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Celeste");
    assert_eq!(token_posts.load(Ordering::SeqCst), 1);

    // The stale token forces one refresh before the search goes out.
    client.search("y").await.unwrap();
    assert_eq!(token_posts.load(Ordering::SeqCst), 2);

    // The refreshed token is still fresh: no further token requests.
    client.search("z").await.unwrap();
    assert_eq!(token_posts.load(Ordering::SeqCst), 2);

    let bodies = search_bodies.lock().await;
    assert_eq!(
        bodies[0],
        r#"search "x"; fields name,url; where game_type = 0;"#
    );
}

#[tokio::test]
async fn upstream_failure_carries_status_and_body() {
    let token_posts = Arc::new(AtomicUsize::new(0));

    let app = token_route(token_posts).route(
        "/games",
        post(|| async {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "igdb is down",
            )
        }),
    );
    let base_url = spawn_server(app).await;

    let client = IgdbClient::new("client".to_string(), "secret".to_string()).with_endpoints(
        format!("{base_url}/oauth2/token"),
        format!("{base_url}/games"),
    );

    let err = client.search("x").await.unwrap_err();
    match err {
        CatalogError::UpstreamFailed { status, body } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "igdb is down");
        }
        other => panic!("expected UpstreamFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_request_is_an_authentication_error() {
    let app = Router::new().route(
        "/oauth2/token",
        post(|| async { (axum::http::StatusCode::FORBIDDEN, "bad credentials") }),
    );
    let base_url = spawn_server(app).await;

    let client = IgdbClient::new("client".to_string(), "bad".to_string()).with_endpoints(
        format!("{base_url}/oauth2/token"),
        format!("{base_url}/games"),
    );

    let err = client.search("x").await.unwrap_err();
    assert!(matches!(err, CatalogError::Unauthenticated(_)), "{err:?}");
}
