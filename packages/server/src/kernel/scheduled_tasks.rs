//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Coarse-cadence work lives here: the enrichment worker trigger, embedding
//! back-fill, stale-embedding refresh, duplicate purge, and old-record
//! purge. The fine-cadence reminder daemon is a `Service`, not a cron job.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::domains::embeddings::backfill::{refresh_stale, run_backfill};
use crate::domains::enrichment::worker::EnrichmentWorker;
use crate::domains::postings::models::CanonicalPosting;
use crate::kernel::deps::ServerDeps;

const STALE_EMBEDDING_DAYS: i64 = 30;
const UNDELIVERED_RETENTION_DAYS: i64 = 5;

/// Start all scheduled tasks
pub async fn start_scheduler(
    deps: ServerDeps,
    config: &Config,
    shutdown: CancellationToken,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Enrichment worker - every 2 hours by default
    let enrich_deps = deps.clone();
    let enrich_shutdown = shutdown.clone();
    let enrich_schedule = format!("0 0 */{} * * *", config.enrichment_interval_hours.max(1));
    let enrich_job = Job::new_async(enrich_schedule.as_str(), move |_uuid, _lock| {
        let deps = enrich_deps.clone();
        let shutdown = enrich_shutdown.clone();
        Box::pin(async move {
            let worker = EnrichmentWorker::new(deps);
            match worker.run_until_drained(&shutdown).await {
                Ok(stats) => tracing::info!(
                    enriched = stats.enriched,
                    failed = stats.failed,
                    alerts = stats.alerts_sent,
                    "scheduled enrichment run complete"
                ),
                Err(e) => tracing::error!("Scheduled enrichment run failed: {}", e),
            }
        })
    })?;
    scheduler.add(enrich_job).await?;

    // Embedding back-fill - every 20 minutes by default
    let backfill_deps = deps.clone();
    let backfill_schedule = format!("0 */{} * * * *", config.backfill_interval_minutes.clamp(1, 59));
    let backfill_job = Job::new_async(backfill_schedule.as_str(), move |_uuid, _lock| {
        let deps = backfill_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_backfill(&deps).await {
                tracing::error!("Embedding back-fill task failed: {}", e);
            }
        })
    })?;
    scheduler.add(backfill_job).await?;

    // Stale-embedding refresh - daily at 03:00
    let stale_deps = deps.clone();
    let stale_job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let deps = stale_deps.clone();
        Box::pin(async move {
            match refresh_stale(&deps, STALE_EMBEDDING_DAYS).await {
                Ok(stats) => tracing::info!(
                    users = stats.users_embedded,
                    postings = stats.postings_embedded,
                    "stale embedding refresh complete"
                ),
                Err(e) => tracing::error!("Stale embedding refresh failed: {}", e),
            }
        })
    })?;
    scheduler.add(stale_job).await?;

    // Duplicate canonical purge - every 5 hours
    let dedup_deps = deps.clone();
    let dedup_job = Job::new_async("0 30 */5 * * *", move |_uuid, _lock| {
        let deps = dedup_deps.clone();
        Box::pin(async move {
            match CanonicalPosting::purge_duplicates(&deps.db_pool).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "duplicate postings purged"),
                Err(e) => tracing::error!("Duplicate purge failed: {}", e),
            }
        })
    })?;
    scheduler.add(dedup_job).await?;

    // Old undelivered postings purge - daily at 04:15
    let purge_deps = deps.clone();
    let purge_job = Job::new_async("0 15 4 * * *", move |_uuid, _lock| {
        let deps = purge_deps.clone();
        Box::pin(async move {
            match CanonicalPosting::purge_undelivered_older_than(
                UNDELIVERED_RETENTION_DAYS,
                &deps.db_pool,
            )
            .await
            {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "old undelivered postings purged"),
                Err(e) => tracing::error!("Old-record purge failed: {}", e),
            }
        })
    })?;
    scheduler.add(purge_job).await?;

    scheduler.start().await?;

    tracing::info!(
        enrichment = %enrich_schedule,
        backfill = %backfill_schedule,
        "scheduled tasks started"
    );
    Ok(scheduler)
}
