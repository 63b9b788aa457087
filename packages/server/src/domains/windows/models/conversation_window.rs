use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::windows::reminders::ReminderStage;

/// Window status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "window_status", rename_all = "lowercase")]
pub enum WindowStatus {
    Active,
    Expired,
}

/// A user's 24-hour outbound window.
///
/// At most one window per user is `active`; opening a new one atomically
/// expires any prior active row. Inbound messages reset `last_activity`;
/// outbound sends only touch `last_outbound_at` and `outbound_count`, so
/// elapsed time is measured purely against inbound activity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationWindow {
    pub id: i64,
    pub user_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub status: WindowStatus,
    pub messages_in_window: i32,
    pub outbound_count: i32,
    pub last_outbound_at: Option<DateTime<Utc>>,
    pub s1_sent: bool,
    pub s2_sent: bool,
    pub s3_sent: bool,
    pub s4_sent: bool,
    pub s5_sent: bool,
}

impl ConversationWindow {
    /// Open a new window, expiring any prior active one in the same
    /// transaction
    pub async fn open(user_id: Uuid, now: DateTime<Utc>, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE conversation_windows SET status = 'expired' WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let window = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO conversation_windows
                (user_id, window_start, last_activity, status, messages_in_window)
            VALUES ($1, $2, $2, 'active', 1)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(window)
    }

    /// Register inbound activity on the active window.
    ///
    /// Returns `None` when the user has no active window; the caller then
    /// opens a new one.
    pub async fn touch(
        user_id: Uuid,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE conversation_windows
            SET last_activity = $2,
                messages_in_window = messages_in_window + 1
            WHERE user_id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Bump outbound bookkeeping. Deliberately does NOT touch
    /// `last_activity`; outbound sends never extend the window.
    pub async fn record_outbound(id: i64, now: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE conversation_windows
            SET outbound_count = outbound_count + 1,
                last_outbound_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The user's active window, if any
    pub async fn find_active(user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM conversation_windows
            WHERE user_id = $1 AND status = 'active'
            ORDER BY window_start DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All active windows, for the reminder daemon scan
    pub async fn find_all_active(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM conversation_windows WHERE status = 'active' ORDER BY last_activity ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Mark the window expired
    pub async fn expire(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE conversation_windows SET status = 'expired' WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Flag a reminder stage as sent on the window row.
    ///
    /// The reminder ledger is the idempotency authority; these flags exist
    /// so stage selection can run without joining the ledger.
    pub async fn mark_stage_sent(id: i64, stage: ReminderStage, pool: &PgPool) -> Result<()> {
        let query = match stage {
            ReminderStage::S1 => "UPDATE conversation_windows SET s1_sent = true WHERE id = $1",
            ReminderStage::S2 => "UPDATE conversation_windows SET s2_sent = true WHERE id = $1",
            ReminderStage::S3 => "UPDATE conversation_windows SET s3_sent = true WHERE id = $1",
            ReminderStage::S4 => "UPDATE conversation_windows SET s4_sent = true WHERE id = $1",
            ReminderStage::S5 => "UPDATE conversation_windows SET s5_sent = true WHERE id = $1",
        };
        sqlx::query(query).bind(id).execute(pool).await?;
        Ok(())
    }

    /// Which stages this window has already sent
    pub fn sent_stages(&self) -> Vec<ReminderStage> {
        let mut stages = Vec::new();
        if self.s1_sent {
            stages.push(ReminderStage::S1);
        }
        if self.s2_sent {
            stages.push(ReminderStage::S2);
        }
        if self.s3_sent {
            stages.push(ReminderStage::S3);
        }
        if self.s4_sent {
            stages.push(ReminderStage::S4);
        }
        if self.s5_sent {
            stages.push(ReminderStage::S5);
        }
        stages
    }
}
