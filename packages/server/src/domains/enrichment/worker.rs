//! Enrichment worker: raw postings in, canonical postings out.
//!
//! Pulls unprocessed raw postings in bounded batches (`scraped_at ASC`),
//! asks the model for structured attributes, composes the canonical record,
//! embeds it, marks the raw row processed, and hands the posting straight
//! to the delivery dispatcher (the zero-delay real-time path).
//!
//! At-most-once per raw id: a record is only marked processed after its
//! canonical row exists. Per-record failures never block the batch.

use chrono::NaiveDate;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domains::delivery::dispatcher::{dispatch_posting, DeliveryStage};
use crate::domains::embeddings::profile::job_profile_text;
use crate::domains::enrichment::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::domains::enrichment::schema::JobEnrichment;
use crate::domains::ingestion::models::RawPosting;
use crate::domains::postings::models::CanonicalPosting;
use crate::kernel::deps::ServerDeps;
use crate::kernel::traits::ModelCallError;
use openai_client::StructuredOutput;

/// Concurrent records in flight within one batch.
const RECORD_CONCURRENCY: usize = 2;
/// Model attempts per record within one batch.
const MAX_MODEL_ATTEMPTS: u32 = 3;

#[derive(Debug, Default)]
pub struct EnrichmentStats {
    pub fetched: usize,
    pub enriched: usize,
    pub deferred: usize,
    pub failed: usize,
    pub alerts_sent: usize,
}

enum RecordOutcome {
    Enriched { alerts_sent: usize },
    /// Transient failure: retried on a later pass
    Deferred,
    /// Deterministic failure recorded against the record
    Failed,
}

pub struct EnrichmentWorker {
    deps: ServerDeps,
}

impl EnrichmentWorker {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    /// Process one batch of unprocessed raw postings.
    pub async fn run_batch(&self, shutdown: &CancellationToken) -> anyhow::Result<EnrichmentStats> {
        let batch = RawPosting::fetch_unprocessed(
            self.deps.settings.enrichment_batch_size,
            &self.deps.db_pool,
        )
        .await?;

        let mut stats = EnrichmentStats {
            fetched: batch.len(),
            ..Default::default()
        };
        if batch.is_empty() {
            return Ok(stats);
        }

        info!(count = batch.len(), "enrichment batch start");

        let mut futures_in_flight: Vec<
            std::pin::Pin<Box<dyn std::future::Future<Output = RecordOutcome> + Send + '_>>,
        > = Vec::with_capacity(batch.len());
        for raw in batch.iter() {
            futures_in_flight.push(Box::pin(self.process_record(raw, shutdown)));
        }
        let outcomes: Vec<RecordOutcome> = futures::stream::iter(futures_in_flight)
            .buffer_unordered(RECORD_CONCURRENCY)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                RecordOutcome::Enriched { alerts_sent } => {
                    stats.enriched += 1;
                    stats.alerts_sent += alerts_sent;
                }
                RecordOutcome::Deferred => stats.deferred += 1,
                RecordOutcome::Failed => stats.failed += 1,
            }
        }

        info!(
            enriched = stats.enriched,
            deferred = stats.deferred,
            failed = stats.failed,
            alerts = stats.alerts_sent,
            "enrichment batch complete"
        );
        Ok(stats)
    }

    /// Drain the queue until empty or cancelled.
    pub async fn run_until_drained(
        &self,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<EnrichmentStats> {
        let mut total = EnrichmentStats::default();
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            let stats = self.run_batch(shutdown).await?;
            let fetched = stats.fetched;
            total.fetched += stats.fetched;
            total.enriched += stats.enriched;
            total.deferred += stats.deferred;
            total.failed += stats.failed;
            total.alerts_sent += stats.alerts_sent;
            // A short or failing batch means the queue is (effectively) dry
            if fetched == 0 || stats.enriched == 0 {
                break;
            }
        }
        Ok(total)
    }

    async fn process_record(
        &self,
        raw: &RawPosting,
        shutdown: &CancellationToken,
    ) -> RecordOutcome {
        if shutdown.is_cancelled() {
            return RecordOutcome::Deferred;
        }

        let enrichment = match self.call_model(raw, shutdown).await {
            Ok(enrichment) => enrichment,
            Err(outcome) => return outcome,
        };

        let posting = compose_canonical(raw, enrichment);

        let posting = match posting.insert(&self.deps.db_pool).await {
            Ok(posting) => posting,
            Err(e) => {
                error!(raw_id = raw.id, error = %e, "canonical insert failed");
                let _ = RawPosting::record_error(raw.id, &e.to_string(), &self.deps.db_pool).await;
                return RecordOutcome::Deferred;
            }
        };

        // Embed; a failure here leaves the posting for the back-fill sweep
        let profile = job_profile_text(&posting);
        let embedded = match self.deps.embeddings.embed(&profile).await {
            Ok(vector) => {
                let stored = CanonicalPosting::set_embedding(
                    posting.id,
                    &vector,
                    &profile,
                    self.deps.embeddings.version(),
                    self.deps.clock.now(),
                    &self.deps.db_pool,
                )
                .await;
                if let Err(e) = stored {
                    warn!(posting_id = posting.id, error = %e, "storing embedding failed");
                    false
                } else {
                    true
                }
            }
            Err(e) => {
                warn!(posting_id = posting.id, error = %e, "embedding failed; back-fill will retry");
                false
            }
        };

        if let Err(e) = RawPosting::mark_processed(raw.id, &self.deps.db_pool).await {
            error!(raw_id = raw.id, error = %e, "marking raw processed failed");
        }

        // Zero-delay real-time fan-out
        let posting = if embedded {
            CanonicalPosting::find_by_id(posting.id, &self.deps.db_pool)
                .await
                .ok()
                .flatten()
                .unwrap_or(posting)
        } else {
            posting
        };

        let alerts_sent = match dispatch_posting(&self.deps, &posting, DeliveryStage::RealTime).await
        {
            Ok(outcome) => outcome.alerts_sent,
            Err(e) => {
                error!(posting_id = posting.id, error = %e, "real-time dispatch failed");
                0
            }
        };

        RecordOutcome::Enriched { alerts_sent }
    }

    /// Call the model with exponential back-off on transient failures.
    async fn call_model(
        &self,
        raw: &RawPosting,
        shutdown: &CancellationToken,
    ) -> Result<JobEnrichment, RecordOutcome> {
        let prompt = user_prompt(raw);
        let schema = JobEnrichment::openai_schema();

        let mut last_error = String::new();
        for attempt in 1..=MAX_MODEL_ATTEMPTS {
            if shutdown.is_cancelled() {
                return Err(RecordOutcome::Deferred);
            }

            match self
                .deps
                .chat_model
                .extract_structured(SYSTEM_PROMPT, &prompt, schema.clone())
                .await
            {
                Ok(json) => {
                    // Schema violations are not retried within the batch
                    return match serde_json::from_str::<JobEnrichment>(&json) {
                        Ok(enrichment) => Ok(enrichment.normalize()),
                        Err(e) => {
                            let message = format!("schema violation: {}", e);
                            warn!(raw_id = raw.id, error = %message, "enrichment rejected");
                            let _ = RawPosting::record_error(raw.id, &message, &self.deps.db_pool)
                                .await;
                            Err(RecordOutcome::Failed)
                        }
                    };
                }
                Err(ModelCallError::Transient(message)) => {
                    warn!(raw_id = raw.id, attempt, error = %message, "transient model failure");
                    last_error = message;
                    if attempt < MAX_MODEL_ATTEMPTS {
                        let backoff = std::time::Duration::from_secs(1 << attempt);
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(ModelCallError::Fatal(message)) => {
                    warn!(raw_id = raw.id, error = %message, "model failure");
                    let _ = RawPosting::record_error(raw.id, &message, &self.deps.db_pool).await;
                    return Err(RecordOutcome::Failed);
                }
            }
        }

        let message = format!("model unavailable after {} attempts: {}", MAX_MODEL_ATTEMPTS, last_error);
        let _ = RawPosting::record_error(raw.id, &message, &self.deps.db_pool).await;
        Err(RecordOutcome::Deferred)
    }
}

/// Compose the canonical record: direct fields from the raw snapshot,
/// inferred fields from the (already normalized) model response.
pub fn compose_canonical(raw: &RawPosting, enrichment: JobEnrichment) -> CanonicalPosting {
    let raw_title = raw.payload_hint("title").map(str::to_string);

    // The first model title is authoritative when the snapshot carried none;
    // the remainder populate the alternates array
    let (title, ai_job_titles) = match raw_title {
        Some(title) => (title, enrichment.ai_job_titles.clone()),
        None => {
            let mut titles = enrichment.ai_job_titles.clone();
            let title = if titles.is_empty() {
                "Job Opportunity".to_string()
            } else {
                titles.remove(0)
            };
            (title, titles)
        }
    };

    let location = raw.payload_hint("location").map(str::to_string);

    // Missing location triple falls back to parsing the display location
    let (ai_city, ai_state, ai_country) = resolve_location_triple(&enrichment, location.as_deref());

    let posted_date = raw
        .payload_hint("date_posted")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| raw.scraped_at.date_naive());

    CanonicalPosting {
        id: 0,
        raw_id: raw.id,
        source: raw.source.clone(),
        title,
        company: raw.payload_hint("company").map(str::to_string),
        location,
        job_url: raw
            .url
            .clone()
            .or_else(|| raw.payload_hint("job_url").map(str::to_string)),
        description: raw
            .payload_hint("description")
            .or_else(|| raw.payload_hint("body"))
            .map(str::to_string),
        employment_type: raw.payload_hint("employment_type").map(str::to_string),
        salary_min: raw.payload.get("salary_min").and_then(|v| v.as_i64()),
        salary_max: raw.payload.get("salary_max").and_then(|v| v.as_i64()),
        salary_currency: raw.payload_hint("salary_currency").map(str::to_string),
        posted_date,
        scraped_at: raw.scraped_at,
        ai_job_titles,
        ai_required_skills: enrichment.ai_required_skills,
        ai_preferred_skills: enrichment.ai_preferred_skills,
        ai_industry: enrichment.ai_industry,
        ai_job_function: none_if_empty(enrichment.ai_job_function),
        ai_job_level: enrichment.ai_job_level,
        ai_city,
        ai_state,
        ai_country,
        ai_work_arrangement: Some(enrichment.ai_work_arrangement),
        ai_remote_allowed: Some(enrichment.ai_remote_allowed),
        ai_salary_min: enrichment.ai_salary_min,
        ai_salary_max: enrichment.ai_salary_max,
        ai_salary_currency: enrichment.ai_salary_currency,
        ai_years_experience_min: enrichment.ai_years_experience_min,
        ai_years_experience_max: enrichment.ai_years_experience_max,
        ai_summary: none_if_empty(enrichment.ai_summary),
        ai_enhanced: false,
        embedding: None,
        embedding_text: None,
        embedding_version: None,
        embedding_updated_at: None,
        created_at: raw.scraped_at,
    }
}

fn none_if_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_location_triple(
    enrichment: &JobEnrichment,
    display_location: Option<&str>,
) -> (Option<String>, Option<String>, Option<String>) {
    let mut city = none_if_empty(enrichment.ai_city.clone());
    let mut state = none_if_empty(enrichment.ai_state.clone());
    let mut country = none_if_empty(enrichment.ai_country.clone());

    if city.is_none() && state.is_none() {
        if let Some(display) = display_location {
            let parts: Vec<&str> = display.split(',').map(str::trim).collect();
            if let Some(first) = parts.first().filter(|p| !p.is_empty()) {
                city = Some(first.to_string());
            }
            if let Some(second) = parts.get(1).filter(|p| !p.is_empty()) {
                state = Some(second.to_string());
            }
            if country.is_none() {
                if let Some(third) = parts.get(2).filter(|p| !p.is_empty()) {
                    country = Some(third.to_string());
                }
            }
        }
    }

    (city, state, country)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw_posting(payload: serde_json::Value) -> RawPosting {
        RawPosting {
            id: 7,
            source: "jobspy".into(),
            source_job_id: "xyz".into(),
            payload,
            url: Some("https://example.com/j/7".into()),
            scraped_at: "2025-06-02T09:00:00Z".parse().unwrap(),
            processed: false,
            error: None,
            created_at: Utc::now(),
        }
    }

    fn enrichment() -> JobEnrichment {
        serde_json::from_value::<JobEnrichment>(serde_json::json!({
            "ai_job_titles": ["Sales Executive", "Sales Rep", "Account Executive"],
            "ai_required_skills": ["negotiation"],
            "ai_preferred_skills": [],
            "ai_industry": ["Technology"],
            "ai_job_function": "Sales",
            "ai_job_level": ["entry"],
            "ai_city": "",
            "ai_state": "",
            "ai_country": "",
            "ai_work_arrangement": "hybrid",
            "ai_remote_allowed": false,
            "ai_salary_min": 220000,
            "ai_salary_max": null,
            "ai_salary_currency": null,
            "ai_years_experience_min": 0,
            "ai_years_experience_max": 2,
            "ai_summary": "Sales role in Lagos."
        }))
        .unwrap()
        .normalize()
    }

    #[test]
    fn raw_title_is_authoritative_when_present() {
        let raw = raw_posting(serde_json::json!({"title": "Snr Sales Exec"}));
        let posting = compose_canonical(&raw, enrichment());
        assert_eq!(posting.title, "Snr Sales Exec");
        assert_eq!(posting.ai_job_titles.len(), 3);
    }

    #[test]
    fn first_model_title_used_when_raw_has_none() {
        let raw = raw_posting(serde_json::json!({}));
        let posting = compose_canonical(&raw, enrichment());
        assert_eq!(posting.title, "Sales Executive");
        assert_eq!(
            posting.ai_job_titles,
            vec!["Sales Rep".to_string(), "Account Executive".to_string()]
        );
    }

    #[test]
    fn missing_posted_date_defaults_to_scrape_date() {
        let raw = raw_posting(serde_json::json!({}));
        let posting = compose_canonical(&raw, enrichment());
        assert_eq!(
            posting.posted_date,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
    }

    #[test]
    fn payload_posted_date_wins() {
        let raw = raw_posting(serde_json::json!({"date_posted": "2025-05-28"}));
        let posting = compose_canonical(&raw, enrichment());
        assert_eq!(
            posting.posted_date,
            NaiveDate::from_ymd_opt(2025, 5, 28).unwrap()
        );
    }

    #[test]
    fn location_triple_falls_back_to_display_location() {
        let raw = raw_posting(serde_json::json!({"location": "Ikeja, Lagos, Nigeria"}));
        let posting = compose_canonical(&raw, enrichment());
        assert_eq!(posting.ai_city.as_deref(), Some("Ikeja"));
        assert_eq!(posting.ai_state.as_deref(), Some("Lagos"));
        assert_eq!(posting.ai_country.as_deref(), Some("Nigeria"));
    }

    #[test]
    fn normalized_salary_carries_into_canonical() {
        let raw = raw_posting(serde_json::json!({}));
        let posting = compose_canonical(&raw, enrichment());
        // Mirrored single-sided range with the regional default currency
        assert_eq!(posting.ai_salary_min, Some(220_000));
        assert_eq!(posting.ai_salary_max, Some(220_000));
        assert_eq!(posting.ai_salary_currency.as_deref(), Some("NGN"));
    }

    #[test]
    fn posting_is_not_enhanced_until_embedded() {
        let raw = raw_posting(serde_json::json!({}));
        let posting = compose_canonical(&raw, enrichment());
        assert!(!posting.ai_enhanced);
    }
}
