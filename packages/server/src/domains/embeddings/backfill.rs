//! Embedding back-fill: sweeps up users and postings that lack vectors.
//!
//! Runs on the scheduler's cadence; also available as a one-shot binary.
//! Uses the batch endpoint so a cold start over many rows stays cheap.

use anyhow::Result;
use tracing::{info, warn};

use crate::domains::embeddings::profile::{job_profile_text, user_profile_text};
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::UserPreferences;
use crate::kernel::deps::ServerDeps;

const BATCH_LIMIT: i64 = 100;

#[derive(Debug, Default)]
pub struct BackfillStats {
    pub users_embedded: usize,
    pub postings_embedded: usize,
    pub errors: usize,
}

/// Embed all users and recent postings that are missing vectors.
pub async fn run_backfill(deps: &ServerDeps) -> Result<BackfillStats> {
    let mut stats = BackfillStats::default();

    backfill_users(deps, &mut stats).await?;
    backfill_postings(deps, &mut stats).await?;

    if stats.users_embedded > 0 || stats.postings_embedded > 0 || stats.errors > 0 {
        info!(
            users = stats.users_embedded,
            postings = stats.postings_embedded,
            errors = stats.errors,
            "embedding back-fill complete"
        );
    }
    Ok(stats)
}

/// Re-embed rows whose vectors predate the cutoff (stale refresh).
pub async fn refresh_stale(deps: &ServerDeps, max_age_days: i64) -> Result<BackfillStats> {
    let cutoff = deps.clock.now() - chrono::Duration::days(max_age_days);
    let mut stats = BackfillStats::default();

    for prefs in UserPreferences::find_stale_embeddings(cutoff, BATCH_LIMIT, &deps.db_pool).await? {
        match embed_user(deps, &prefs).await {
            Ok(()) => stats.users_embedded += 1,
            Err(e) => {
                warn!(user_id = %prefs.user_id, error = %e, "stale user refresh failed");
                stats.errors += 1;
            }
        }
    }

    for posting in
        CanonicalPosting::find_stale_embeddings(cutoff, BATCH_LIMIT, &deps.db_pool).await?
    {
        match embed_posting(deps, &posting).await {
            Ok(()) => stats.postings_embedded += 1,
            Err(e) => {
                warn!(posting_id = posting.id, error = %e, "stale posting refresh failed");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

async fn backfill_users(deps: &ServerDeps, stats: &mut BackfillStats) -> Result<()> {
    let pending = UserPreferences::find_missing_embedding(BATCH_LIMIT, &deps.db_pool).await?;
    if pending.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = pending.iter().map(user_profile_text).collect();
    let vectors = match deps.embeddings.embed_batch(&texts).await {
        Ok(vectors) => vectors,
        Err(e) => {
            warn!(error = %e, "user embedding batch failed");
            stats.errors += pending.len();
            return Ok(());
        }
    };

    let now = deps.clock.now();
    let version = deps.embeddings.version();
    for (prefs, (text, vector)) in pending.iter().zip(texts.iter().zip(vectors.iter())) {
        match UserPreferences::set_embedding(
            prefs.user_id,
            vector,
            text,
            version,
            now,
            &deps.db_pool,
        )
        .await
        {
            Ok(()) => stats.users_embedded += 1,
            Err(e) => {
                warn!(user_id = %prefs.user_id, error = %e, "storing user embedding failed");
                stats.errors += 1;
            }
        }
    }
    Ok(())
}

async fn backfill_postings(deps: &ServerDeps, stats: &mut BackfillStats) -> Result<()> {
    let pending = CanonicalPosting::find_missing_embedding(BATCH_LIMIT, &deps.db_pool).await?;
    if pending.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = pending.iter().map(job_profile_text).collect();
    let vectors = match deps.embeddings.embed_batch(&texts).await {
        Ok(vectors) => vectors,
        Err(e) => {
            warn!(error = %e, "posting embedding batch failed");
            stats.errors += pending.len();
            return Ok(());
        }
    };

    let now = deps.clock.now();
    let version = deps.embeddings.version();
    for (posting, (text, vector)) in pending.iter().zip(texts.iter().zip(vectors.iter())) {
        match CanonicalPosting::set_embedding(
            posting.id,
            vector,
            text,
            version,
            now,
            &deps.db_pool,
        )
        .await
        {
            Ok(()) => stats.postings_embedded += 1,
            Err(e) => {
                warn!(posting_id = posting.id, error = %e, "storing posting embedding failed");
                stats.errors += 1;
            }
        }
    }
    Ok(())
}

async fn embed_user(deps: &ServerDeps, prefs: &UserPreferences) -> Result<()> {
    let text = user_profile_text(prefs);
    let vector = deps.embeddings.embed(&text).await?;
    UserPreferences::set_embedding(
        prefs.user_id,
        &vector,
        &text,
        deps.embeddings.version(),
        deps.clock.now(),
        &deps.db_pool,
    )
    .await
}

async fn embed_posting(deps: &ServerDeps, posting: &CanonicalPosting) -> Result<()> {
    let text = job_profile_text(posting);
    let vector = deps.embeddings.embed(&text).await?;
    CanonicalPosting::set_embedding(
        posting.id,
        &vector,
        &text,
        deps.embeddings.version(),
        deps.clock.now(),
        &deps.db_pool,
    )
    .await
}
