use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// How an alert reached (or tried to reach) the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "delivery_stage", rename_all = "snake_case")]
pub enum DeliveryStage {
    RealTime,
    Backfill,
}

/// One row per (user, posting) pair that was dispatched.
///
/// The unique (user_id, posting_id) constraint is the deduplication
/// mechanism: the row is inserted BEFORE the outbound send, so a racing
/// dispatcher loses the insert and aborts its send.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryHistory {
    pub id: i64,
    pub user_id: Uuid,
    pub posting_id: i64,
    pub match_score: f64,
    pub stage: DeliveryStage,
    pub sent: bool,
    pub error: Option<String>,
    pub retryable: bool,
    pub shown_at: DateTime<Utc>,
}

impl DeliveryHistory {
    /// Claim the (user, posting) pair. Returns `None` when a row already
    /// exists; the caller must then abort its outbound.
    pub async fn insert_pending(
        user_id: Uuid,
        posting_id: i64,
        match_score: f64,
        stage: DeliveryStage,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO delivery_history (user_id, posting_id, match_score, stage, sent)
            VALUES ($1, $2, $3, $4, false)
            ON CONFLICT (user_id, posting_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(posting_id)
        .bind(match_score)
        .bind(stage)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Record a successful send
    pub async fn mark_sent(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE delivery_history SET sent = true, error = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a failed send. `retryable` marks rows the back-fill scan may
    /// pick up again; provider 4xx failures are final.
    pub async fn record_error(id: i64, error: &str, retryable: bool, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE delivery_history SET error = $2, retryable = $3 WHERE id = $1")
            .bind(id)
            .bind(error)
            .bind(retryable)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Whether the user already has a row for this posting
    pub async fn exists(user_id: Uuid, posting_id: i64, pool: &PgPool) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM delivery_history WHERE user_id = $1 AND posting_id = $2)",
        )
        .bind(user_id)
        .bind(posting_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// History rows stamped today for this user (the daily-cap counter)
    pub async fn count_today(user_id: Uuid, pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM delivery_history
            WHERE user_id = $1 AND shown_at::date = CURRENT_DATE
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Failed-but-retryable sends for this user, oldest first
    pub async fn find_failed_retryable(
        user_id: Uuid,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM delivery_history
            WHERE user_id = $1 AND sent = false AND retryable = true
            ORDER BY shown_at ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Alerts actually sent today, for the metrics endpoint
    pub async fn count_sent_today(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM delivery_history WHERE sent AND shown_at::date = CURRENT_DATE",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
