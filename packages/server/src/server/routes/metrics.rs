use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Duration;
use serde::Serialize;

use crate::domains::delivery::models::DeliveryHistory;
use crate::domains::ingestion::models::RawPosting;
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::{User, UserPreferences};
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct MetricsResponse {
    users_total: i64,
    users_active_24h: i64,
    raw_postings_received: i64,
    raw_postings_processed: i64,
    canonical_postings_created: i64,
    alerts_sent_today: i64,
    user_embedding_coverage_percent: f64,
    posting_embedding_coverage_percent: f64,
    avg_enrichment_latency_seconds: Option<f64>,
}

/// Token-gated operational counters.
pub async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MetricsResponse>, StatusCode> {
    let Some(expected) = state.metrics_token.as_deref() else {
        return Err(StatusCode::NOT_FOUND);
    };
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false);
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let pool = &state.deps.db_pool;
    let day_ago = state.deps.clock.now() - Duration::hours(24);

    let gather = async {
        let (raw_received, raw_processed) = RawPosting::counts(pool).await?;
        anyhow::Ok(MetricsResponse {
            users_total: User::count_total(pool).await?,
            users_active_24h: User::count_active_since(day_ago, pool).await?,
            raw_postings_received: raw_received,
            raw_postings_processed: raw_processed,
            canonical_postings_created: CanonicalPosting::count_total(pool).await?,
            alerts_sent_today: DeliveryHistory::count_sent_today(pool).await?,
            user_embedding_coverage_percent: UserPreferences::embedding_coverage(pool).await?,
            posting_embedding_coverage_percent: CanonicalPosting::embedding_coverage(pool).await?,
            avg_enrichment_latency_seconds: CanonicalPosting::average_enrichment_latency_seconds(
                pool,
            )
            .await?,
        })
    };

    match gather.await {
        Ok(metrics) => Ok(Json(metrics)),
        Err(e) => {
            tracing::error!(error = %e, "metrics collection failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
