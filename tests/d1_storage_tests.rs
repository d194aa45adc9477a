use axum::{Json, Router, routing::post};
use opztv_catalog::CatalogError;
use opztv_catalog::storage::{D1Storage, SqlValue, Storage};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

type CapturedRequests = Arc<Mutex<Vec<Value>>>;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Mock D1 query endpoint: records every request body and answers with a
/// fixed response.
async fn mock_d1(response: Value) -> (D1Storage, CapturedRequests) {
    let captured: CapturedRequests = Arc::new(Mutex::new(Vec::new()));

    let requests = captured.clone();
    let app = Router::new().route(
        "/accounts/{account}/d1/database/{database}/query",
        post(move |Json(body): Json<Value>| {
            let requests = requests.clone();
            let response = response.clone();
            async move {
                requests.lock().await.push(body);
                Json(response)
            }
        }),
    );
    let base_url = spawn_server(app).await;

    let storage = D1Storage::with_base_url(&base_url, "acc-1", "db-1", "token".to_string());
    (storage, captured)
}

fn write_ok_response() -> Value {
    json!({
        "result": [
            {"success": true, "meta": {}, "results": []},
            {
                "success": true,
                "meta": {
                    "changed_db": true,
                    "changes": 1.0,
                    "duration": 0.2,
                    "last_row_id": 7.0,
                    "rows_read": 0.0,
                    "rows_written": 1.0,
                    "size_after": 4096.0
                },
                "results": []
            }
        ]
    })
}

#[tokio::test]
async fn writes_inline_arguments_and_defer_foreign_keys() {
    let (storage, captured) = mock_d1(write_ok_response()).await;

    let result = storage
        .exec(
            "UPDATE games SET name=? WHERE id=?",
            &[
                SqlValue::Text("O'Brien".to_string()),
                SqlValue::Integer(1),
            ],
        )
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_insert_id, 7);

    let requests = captured.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]["sql"],
        "PRAGMA defer_foreign_keys = on; UPDATE games SET name='O''Brien' WHERE id=1"
    );
    // Inlined writes must not carry a params array.
    assert!(requests[0].get("params").is_none());
}

#[tokio::test]
async fn reads_keep_placeholders_and_ship_string_params() {
    let response = json!({
        "result": [{
            "success": true,
            "meta": {"rows_read": 1.0},
            "results": [
                {
                    "id": "vid-1",
                    "title": "Upload",
                    "published_at": "2025-10-22T09:00:27Z",
                    "created_at": "2025-10-24 16:48:30.211971376 +0700 +07 m=+50.1",
                    "updated_at": "2025-10-24 16:48:30",
                    "game_id": null
                }
            ]
        }]
    });
    let (storage, captured) = mock_d1(response).await;

    let rows = storage
        .query(
            "SELECT * FROM videos WHERE id = ? LIMIT ?",
            &[SqlValue::Text("vid-1".to_string()), SqlValue::Integer(1)],
        )
        .await
        .unwrap();

    let requests = captured.lock().await;
    assert_eq!(requests[0]["sql"], "SELECT * FROM videos WHERE id = ? LIMIT ?");
    assert_eq!(requests[0]["params"], json!(["vid-1", "1"]));

    // Timestamp-shaped strings come back in the canonical form; everything
    // else is untouched.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["published_at"], "2025-10-22 09:00:27");
    assert_eq!(rows[0]["created_at"], "2025-10-24 16:48:30");
    assert_eq!(rows[0]["updated_at"], "2025-10-24 16:48:30");
    assert_eq!(rows[0]["title"], "Upload");
    assert!(rows[0]["game_id"].is_null());
}

#[tokio::test]
async fn empty_result_envelope_is_a_query_failure() {
    let (storage, _captured) = mock_d1(json!({"result": []})).await;

    let err = storage.query("SELECT 1", &[]).await.unwrap_err();
    match err {
        CatalogError::QueryFailed(message) => {
            assert_eq!(message, "no results returned from D1");
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unsuccessful_result_carries_the_server_message() {
    let response = json!({
        "result": [{"success": false, "meta": {}, "results": []}],
        "errors": [{"code": 7500, "message": "no such table: videos"}]
    });
    let (storage, _captured) = mock_d1(response).await;

    let err = storage
        .exec("DELETE FROM videos WHERE id = ?", &[SqlValue::Integer(1)])
        .await
        .unwrap_err();
    match err {
        CatalogError::QueryFailed(message) => {
            assert_eq!(message, "no such table: videos");
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_backend_unavailable() {
    let storage =
        D1Storage::with_base_url("http://127.0.0.1:9", "acc-1", "db-1", "token".to_string());

    let err = storage.query("SELECT 1", &[]).await.unwrap_err();
    assert!(
        matches!(err, CatalogError::BackendUnavailable(_)),
        "{err:?}"
    );

    let err = storage.ping().await.unwrap_err();
    assert!(matches!(err, CatalogError::BackendUnavailable(_)));
}

#[tokio::test]
async fn transactions_are_rejected_with_a_distinguished_error() {
    let storage =
        D1Storage::with_base_url("http://127.0.0.1:9", "acc-1", "db-1", "token".to_string());

    let err = storage.begin().unwrap_err();
    assert!(matches!(err, CatalogError::TransactionsUnsupported));
    assert_eq!(
        err.to_string(),
        "transactions not supported with D1 REST API"
    );
}

#[tokio::test]
async fn ping_runs_a_trivial_select() {
    let response = json!({
        "result": [{"success": true, "meta": {}, "results": [{"1": 1}]}]
    });
    let (storage, captured) = mock_d1(response).await;

    storage.ping().await.unwrap();

    let requests = captured.lock().await;
    assert_eq!(requests[0]["sql"], "SELECT 1");
}
