use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::windows::reminders::ReminderStage;

/// Append-only reminder ledger.
///
/// The unique (window_id, stage) constraint is what makes reminder delivery
/// at-most-once per stage per window: the row is recorded before the
/// transmit, so a crashed or racing scan cannot double-send.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderLog {
    pub id: i64,
    pub user_id: Uuid,
    pub window_id: i64,
    pub stage: ReminderStage,
    pub sent_at: DateTime<Utc>,
}

impl ReminderLog {
    /// Claim the (window, stage) slot. Returns false when already claimed.
    pub async fn try_record(
        user_id: Uuid,
        window_id: i64,
        stage: ReminderStage,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO reminder_log (user_id, window_id, stage, sent_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (window_id, stage) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(window_id)
        .bind(stage)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Stages already recorded for a window
    pub async fn stages_for_window(window_id: i64, pool: &PgPool) -> Result<Vec<ReminderStage>> {
        let rows: Vec<(ReminderStage,)> =
            sqlx::query_as("SELECT stage FROM reminder_log WHERE window_id = $1")
                .bind(window_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(stage,)| stage).collect())
    }
}
