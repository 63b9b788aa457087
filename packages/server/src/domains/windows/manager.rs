//! Window manager: owns every conversation-window mutation.
//!
//! The provider only permits outbound messages within 24 hours of the last
//! inbound message from a handle; this enforces that application-side.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::windows::models::{ConversationWindow, ReminderLog};
use crate::domains::windows::reminders::{due_stage, ReminderStage};
use crate::kernel::traits::{BaseMessenger, Clock};

pub struct WindowManager {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    window_hours: i64,
}

impl WindowManager {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>, window_hours: i64) -> Self {
        Self {
            pool,
            clock,
            window_hours,
        }
    }

    /// Register an inbound message: refresh the active window or open a new
    /// one (atomically closing any prior active window).
    pub async fn register_inbound(&self, user_id: Uuid) -> Result<ConversationWindow> {
        let now = self.clock.now();
        if let Some(window) = ConversationWindow::touch(user_id, now, &self.pool).await? {
            return Ok(window);
        }
        let window = ConversationWindow::open(user_id, now, &self.pool).await?;
        info!(user_id = %user_id, window_id = window.id, "opened new conversation window");
        Ok(window)
    }

    /// Elapsed time, measured from the last INBOUND activity.
    pub fn elapsed(&self, window: &ConversationWindow) -> Duration {
        self.clock.now() - window.last_activity
    }

    /// Whether the window has aged out. Exactly at the boundary counts as
    /// expired: 24h - 1s is active, 24h is not.
    pub fn is_expired(&self, window: &ConversationWindow) -> bool {
        self.elapsed(window) >= Duration::hours(self.window_hours)
    }

    /// Whether outbound messages to this user are currently permitted.
    pub async fn outbound_permitted(&self, user_id: Uuid) -> Result<bool> {
        match ConversationWindow::find_active(user_id, &self.pool).await? {
            Some(window) => Ok(!self.is_expired(&window)),
            None => Ok(false),
        }
    }

    /// Expire the window row.
    pub async fn expire(&self, window: &ConversationWindow) -> Result<()> {
        ConversationWindow::expire(window.id, &self.pool).await?;
        info!(user_id = %window.user_id, window_id = window.id, "window expired");
        Ok(())
    }

    /// Dispatch the due reminder for a window, if any.
    ///
    /// Selection picks the highest unsent stage the window has crossed.
    /// The ledger row is recorded BEFORE the transmit: a crash between the
    /// two loses one reminder rather than ever duplicating one.
    pub async fn dispatch_due_reminder(
        &self,
        window: &ConversationWindow,
        phone_number: &str,
        messenger: &dyn BaseMessenger,
        alerts_sent_today: i64,
    ) -> Result<Option<ReminderStage>> {
        let elapsed = self.elapsed(window);
        if elapsed >= Duration::hours(self.window_hours) {
            return Ok(None);
        }

        let Some(stage) = due_stage(elapsed, &window.sent_stages()) else {
            return Ok(None);
        };

        let now = self.clock.now();
        let claimed =
            ReminderLog::try_record(window.user_id, window.id, stage, now, &self.pool).await?;
        if !claimed {
            // Another scan already owns this stage
            return Ok(None);
        }

        let monitoring_hours = (now - window.window_start).num_hours().max(0);
        let body = stage.message(alerts_sent_today, monitoring_hours);

        match messenger.send_text(phone_number, &body).await {
            Ok(()) => {
                ConversationWindow::mark_stage_sent(window.id, stage, &self.pool).await?;
                ConversationWindow::record_outbound(window.id, now, &self.pool).await?;
                info!(
                    user_id = %window.user_id,
                    window_id = window.id,
                    stage = stage.label(),
                    "reminder sent"
                );
                Ok(Some(stage))
            }
            Err(e) => {
                // Ledger row stays: the stage is spent, never re-sent
                warn!(
                    user_id = %window.user_id,
                    window_id = window.id,
                    stage = stage.label(),
                    error = %e,
                    "reminder send failed"
                );
                ConversationWindow::mark_stage_sent(window.id, stage, &self.pool).await?;
                Ok(None)
            }
        }
    }
}
