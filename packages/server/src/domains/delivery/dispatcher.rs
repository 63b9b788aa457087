//! Delivery dispatcher: fans a canonical posting out to every matched,
//! eligible user.
//!
//! Invoked synchronously by the enrichment worker right after a posting is
//! persisted (the real-time path) and by the reminder daemon's back-fill
//! scan. History is written BEFORE the send: the unique (user, posting)
//! constraint makes a racing dispatch lose its insert and abort the
//! outbound, which is the whole deduplication story.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chrono::Duration;
use tracing::{info, warn};

use crate::domains::delivery::messages::job_alert;
use crate::domains::delivery::models::DeliveryHistory;

pub use crate::domains::delivery::models::DeliveryStage;
use crate::domains::matching::engine::{MatchEngine, MatchOutcome};
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::{User, UserPreferences};
use crate::domains::windows::models::ConversationWindow;
use crate::kernel::deps::ServerDeps;
use crate::kernel::traits::SendError;

/// A user who passed the eligibility predicate.
pub struct EligibleUser {
    pub user: User,
    pub prefs: UserPreferences,
    pub window: ConversationWindow,
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub eligible_users: usize,
    pub matches_found: usize,
    pub alerts_sent: usize,
    pub errors: usize,
}

/// Users eligible for delivery right now: active, confirmed preferences,
/// open (unexpired) window, daily cap not reached.
pub async fn eligible_cohort(deps: &ServerDeps) -> Result<Vec<EligibleUser>> {
    let rows: Vec<(uuid::Uuid,)> = sqlx::query_as(
        r#"
        SELECT u.id
        FROM users u
        JOIN user_preferences p ON p.user_id = u.id
        JOIN conversation_windows w ON w.user_id = u.id AND w.status = 'active'
        WHERE u.is_active AND p.confirmed
        "#,
    )
    .fetch_all(&deps.db_pool)
    .await?;

    let window_limit = Duration::hours(deps.settings.window_hours);
    let now = deps.clock.now();

    let mut cohort = Vec::new();
    for (user_id,) in rows {
        let Some(user) = User::find_by_id(user_id, &deps.db_pool).await? else {
            continue;
        };
        let Some(prefs) = UserPreferences::find_by_user(user_id, &deps.db_pool).await? else {
            continue;
        };
        let Some(window) = ConversationWindow::find_active(user_id, &deps.db_pool).await? else {
            continue;
        };

        // Provider rule: no outbound once the window has aged out
        if now - window.last_activity >= window_limit {
            continue;
        }

        // Daily cap: quietly skip, not an error
        let today = DeliveryHistory::count_today(user_id, &deps.db_pool).await?;
        if today >= deps.settings.daily_alert_cap {
            continue;
        }

        cohort.push(EligibleUser {
            user,
            prefs,
            window,
        });
    }
    Ok(cohort)
}

/// Fan a posting out to the eligible cohort.
pub async fn dispatch_posting(
    deps: &ServerDeps,
    posting: &CanonicalPosting,
    stage: DeliveryStage,
) -> Result<DispatchOutcome> {
    let cohort = eligible_cohort(deps).await?;
    let mut outcome = DispatchOutcome {
        eligible_users: cohort.len(),
        ..Default::default()
    };
    if cohort.is_empty() {
        return Ok(outcome);
    }

    let engine = MatchEngine::new(
        deps.settings.similarity_threshold,
        deps.settings.min_match_score,
    );

    // Spam brake for large scrapes: at most N alerts per dispatched posting
    let sent_counter = AtomicUsize::new(0);
    let max_alerts = deps.settings.max_alerts_per_batch;

    let results = futures::future::join_all(cohort.iter().map(|eligible| {
        let engine = &engine;
        let sent_counter = &sent_counter;
        async move {
            let decision = engine.match_user_to_posting(&eligible.prefs, posting)?;
            if sent_counter.load(Ordering::SeqCst) >= max_alerts {
                return None;
            }
            Some(dispatch_to_user(deps, posting, eligible, &decision, stage, sent_counter).await)
        }
    }))
    .await;

    for result in results.into_iter().flatten() {
        outcome.matches_found += 1;
        match result {
            Ok(true) => outcome.alerts_sent += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(posting_id = posting.id, error = %e, "dispatch error");
                outcome.errors += 1;
            }
        }
    }

    if outcome.matches_found > 0 {
        info!(
            posting_id = posting.id,
            eligible = outcome.eligible_users,
            matches = outcome.matches_found,
            alerts = outcome.alerts_sent,
            "posting dispatched"
        );
    }
    Ok(outcome)
}

/// Dispatch one alert to one user. Returns true when the outbound was sent.
pub async fn dispatch_to_user(
    deps: &ServerDeps,
    posting: &CanonicalPosting,
    eligible: &EligibleUser,
    decision: &MatchOutcome,
    stage: DeliveryStage,
    sent_counter: &AtomicUsize,
) -> Result<bool> {
    // Claim the (user, posting) pair first; a loser here has already been
    // handled by someone else
    let Some(history) = DeliveryHistory::insert_pending(
        eligible.user.id,
        posting.id,
        decision.score,
        stage,
        &deps.db_pool,
    )
    .await?
    else {
        return Ok(false);
    };

    let body = job_alert(posting, decision.score, &decision.reasons);

    match deps.messenger.send_text(&eligible.user.phone_number, &body).await {
        Ok(()) => {
            DeliveryHistory::mark_sent(history.id, &deps.db_pool).await?;
            ConversationWindow::record_outbound(eligible.window.id, deps.clock.now(), &deps.db_pool)
                .await?;
            sent_counter.fetch_add(1, Ordering::SeqCst);
            info!(
                user_id = %eligible.user.id,
                posting_id = posting.id,
                score = decision.score,
                "alert sent"
            );
            Ok(true)
        }
        Err(SendError::Permanent(message)) => {
            // Provider 4xx: recorded, never retried
            DeliveryHistory::record_error(history.id, &message, false, &deps.db_pool).await?;
            warn!(user_id = %eligible.user.id, error = %message, "alert rejected by provider");
            Ok(false)
        }
        Err(SendError::Retryable(message)) => {
            // Transport/5xx: the back-fill scan may retry, subject to caps
            DeliveryHistory::record_error(history.id, &message, true, &deps.db_pool).await?;
            warn!(user_id = %eligible.user.id, error = %message, "alert send failed");
            Ok(false)
        }
    }
}

/// Retry this user's failed-but-retryable sends (daemon back-fill path).
pub async fn retry_failed_sends(deps: &ServerDeps, eligible: &EligibleUser) -> Result<usize> {
    let today = DeliveryHistory::count_today(eligible.user.id, &deps.db_pool).await?;
    let budget = (deps.settings.daily_alert_cap - today).max(0);
    if budget == 0 {
        return Ok(0);
    }

    let failed =
        DeliveryHistory::find_failed_retryable(eligible.user.id, budget, &deps.db_pool).await?;
    let mut resent = 0;
    for entry in failed {
        let Some(posting) = CanonicalPosting::find_by_id(entry.posting_id, &deps.db_pool).await?
        else {
            continue;
        };
        let body = job_alert(&posting, entry.match_score, &[]);
        match deps.messenger.send_text(&eligible.user.phone_number, &body).await {
            Ok(()) => {
                DeliveryHistory::mark_sent(entry.id, &deps.db_pool).await?;
                ConversationWindow::record_outbound(
                    eligible.window.id,
                    deps.clock.now(),
                    &deps.db_pool,
                )
                .await?;
                resent += 1;
            }
            Err(SendError::Permanent(message)) => {
                DeliveryHistory::record_error(entry.id, &message, false, &deps.db_pool).await?;
            }
            Err(SendError::Retryable(message)) => {
                DeliveryHistory::record_error(entry.id, &message, true, &deps.db_pool).await?;
            }
        }
    }
    Ok(resent)
}
