//! Reminder daemon: fine-cadence scan over open windows.
//!
//! Every cycle: expire windows past the 24-hour mark, dispatch due
//! reminders (ledger-enforced at-most-once), then run the non-real-time
//! delivery back-fill for users still inside their window.

use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domains::delivery::dispatcher::{
    dispatch_to_user, eligible_cohort, retry_failed_sends, EligibleUser,
};
use crate::domains::delivery::models::{DeliveryHistory, DeliveryStage};
use crate::domains::matching::engine::{MatchEngine, MatchMethod, MatchOutcome};
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::User;
use crate::domains::windows::manager::WindowManager;
use crate::domains::windows::models::ConversationWindow;
use crate::kernel::deps::ServerDeps;
use crate::kernel::service::Service;

pub struct ReminderDaemon {
    deps: ServerDeps,
    interval: Duration,
}

impl ReminderDaemon {
    pub fn new(deps: ServerDeps, interval: Duration) -> Self {
        Self { deps, interval }
    }

    /// One scan: expiries, reminders, then delivery back-fill.
    pub async fn run_cycle(&self) -> Result<()> {
        let manager = WindowManager::new(
            self.deps.db_pool.clone(),
            self.deps.clock.clone(),
            self.deps.settings.window_hours,
        );

        let windows = ConversationWindow::find_all_active(&self.deps.db_pool).await?;
        let mut reminders_sent = 0;
        let mut expired = 0;

        for window in &windows {
            if manager.is_expired(window) {
                if let Err(e) = manager.expire(window).await {
                    error!(window_id = window.id, error = %e, "expiring window failed");
                }
                expired += 1;
                continue;
            }

            let Some(user) = User::find_by_id(window.user_id, &self.deps.db_pool).await? else {
                continue;
            };
            let alerts_today =
                DeliveryHistory::count_today(window.user_id, &self.deps.db_pool).await?;

            match manager
                .dispatch_due_reminder(
                    window,
                    &user.phone_number,
                    self.deps.messenger.as_ref(),
                    alerts_today,
                )
                .await
            {
                Ok(Some(_)) => reminders_sent += 1,
                Ok(None) => {}
                Err(e) => {
                    error!(window_id = window.id, error = %e, "reminder dispatch failed");
                }
            }
        }

        let backfilled = match self.run_delivery_backfill().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "delivery back-fill failed");
                0
            }
        };

        if reminders_sent > 0 || expired > 0 || backfilled > 0 {
            info!(
                scanned = windows.len(),
                reminders = reminders_sent,
                expired,
                backfilled,
                "reminder cycle complete"
            );
        }
        Ok(())
    }

    /// Catch users up on recent postings they qualified for but never
    /// received: retry transient send failures, then embedding-match the
    /// recent candidate set. Everything stays under the daily cap.
    async fn run_delivery_backfill(&self) -> Result<usize> {
        let cohort = eligible_cohort(&self.deps).await?;
        let mut delivered = 0;

        for eligible in &cohort {
            delivered += retry_failed_sends(&self.deps, eligible).await?;
            delivered += self.backfill_matches(eligible).await.unwrap_or_else(|e| {
                warn!(user_id = %eligible.user.id, error = %e, "back-fill matching failed");
                0
            });
        }
        Ok(delivered)
    }

    async fn backfill_matches(&self, eligible: &EligibleUser) -> Result<usize> {
        let Some(user_embedding) = eligible.prefs.embedding.as_ref() else {
            return Ok(0);
        };
        let Some(version) = eligible.prefs.embedding_version else {
            return Ok(0);
        };

        let today = DeliveryHistory::count_today(eligible.user.id, &self.deps.db_pool).await?;
        let budget = (self.deps.settings.daily_alert_cap - today).max(0);
        if budget == 0 {
            return Ok(0);
        }

        let candidates = CanonicalPosting::find_similar(
            user_embedding,
            version,
            self.deps.settings.similarity_threshold,
            budget,
            &self.deps.db_pool,
        )
        .await?;

        let engine = MatchEngine::new(
            self.deps.settings.similarity_threshold,
            self.deps.settings.min_match_score,
        );
        let counter = AtomicUsize::new(0);
        let mut sent = 0;

        for candidate in candidates {
            if DeliveryHistory::exists(eligible.user.id, candidate.posting.id, &self.deps.db_pool)
                .await?
            {
                continue;
            }
            let decision = engine
                .match_user_to_posting(&eligible.prefs, &candidate.posting)
                .unwrap_or(MatchOutcome {
                    score: (candidate.similarity * 100.0).min(100.0),
                    reasons: vec![format!(
                        "semantic similarity: {:.0}%",
                        candidate.similarity * 100.0
                    )],
                    method: MatchMethod::Embedding,
                });

            let was_sent = dispatch_to_user(
                &self.deps,
                &candidate.posting,
                eligible,
                &decision,
                DeliveryStage::Backfill,
                &counter,
            )
            .await?;
            if was_sent {
                sent += 1;
            }
        }
        Ok(sent)
    }
}

#[async_trait::async_trait]
impl Service for ReminderDaemon {
    fn name(&self) -> &'static str {
        "reminder-daemon"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(interval_secs = self.interval.as_secs(), "reminder daemon starting");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "reminder cycle failed");
                    }
                }
            }
        }
        info!("reminder daemon stopped");
        Ok(())
    }
}
