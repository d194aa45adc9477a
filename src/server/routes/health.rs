use crate::model::HealthResponse;
use crate::server::router::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

/// Database health probe: a trivial SELECT decides between `healthy` and
/// `degraded`; the latter carries 503 so load balancers can act on it.
pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.repo.ping().await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    let uptime = format!("{:?}", state.started_at.elapsed());

    let response = HealthResponse {
        status: if database == "healthy" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        database: database.to_string(),
        uptime,
    };

    let status = if database == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
