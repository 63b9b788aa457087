use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    dependencies: DependencyStatus,
}

#[derive(Serialize)]
pub struct DependencyStatus {
    database: String,
    chat_provider: String,
    language_model: String,
    embedding_service: String,
}

/// Health check endpoint with per-dependency status.
///
/// The database is probed live; the external clients are constructed at
/// startup from validated credentials, so they report configured rather
/// than being pinged on every probe.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_status = match sqlx::query("SELECT 1").execute(&state.deps.db_pool).await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    let healthy = db_status == "ok";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            dependencies: DependencyStatus {
                database: db_status.to_string(),
                chat_provider: "configured".to_string(),
                language_model: "configured".to_string(),
                embedding_service: "configured".to_string(),
            },
        }),
    )
}
