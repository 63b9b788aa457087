use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Immutable snapshot of a scraped posting.
///
/// The `processed = false` rows ARE the enrichment queue: there is no
/// in-memory buffering, the store's write throughput is the regulator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawPosting {
    pub id: i64,
    pub source: String,
    pub source_job_id: String,
    pub payload: serde_json::Value,
    pub url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub processed: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of an enqueue attempt.
#[derive(Debug)]
pub enum EnqueueOutcome {
    Inserted(RawPosting),
    Duplicate,
}

impl EnqueueOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EnqueueOutcome::Duplicate)
    }
}

impl RawPosting {
    /// Enqueue a scraped record. Idempotent on (source, source_job_id):
    /// a repeat enqueue returns `Duplicate` without side effects.
    pub async fn enqueue(
        source: &str,
        source_job_id: &str,
        payload: serde_json::Value,
        url: Option<&str>,
        scraped_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<EnqueueOutcome> {
        let inserted = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO raw_postings (source, source_job_id, payload, url, scraped_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source, source_job_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(source)
        .bind(source_job_id)
        .bind(payload)
        .bind(url)
        .bind(scraped_at)
        .fetch_optional(pool)
        .await?;

        Ok(match inserted {
            Some(row) => EnqueueOutcome::Inserted(row),
            None => EnqueueOutcome::Duplicate,
        })
    }

    /// Fetch the next batch of unprocessed postings, oldest scrape first
    pub async fn fetch_unprocessed(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM raw_postings
            WHERE processed = false
            ORDER BY scraped_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Mark a posting as processed, clearing any prior error
    pub async fn mark_processed(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE raw_postings SET processed = true, error = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record an enrichment failure; the row stays unprocessed for retry
    pub async fn record_error(id: i64, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE raw_postings SET error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// (received, processed) counts for the metrics endpoint
    pub async fn counts(pool: &PgPool) -> Result<(i64, i64)> {
        let (received, processed): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE processed) FROM raw_postings",
        )
        .fetch_one(pool)
        .await?;
        Ok((received, processed))
    }

    /// Extract a string hint from the opaque payload (e.g. "title", "company")
    pub fn payload_hint(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}
