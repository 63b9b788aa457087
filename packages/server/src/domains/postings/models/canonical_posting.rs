use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use pgvector::Vector;
use sqlx::PgPool;

use crate::common::types::WorkArrangement;

/// Normalized job record produced by enrichment.
///
/// Two attribute tiers: direct fields copied from the raw snapshot, and
/// `ai_*` fields inferred by the language model. `ai_enhanced` is true only
/// once both the structured enrichment and the embedding are written.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CanonicalPosting {
    pub id: i64,
    pub raw_id: i64,
    pub source: String,

    // Direct tier
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub posted_date: NaiveDate,
    pub scraped_at: DateTime<Utc>,

    // Inferred tier
    pub ai_job_titles: Vec<String>,
    pub ai_required_skills: Vec<String>,
    pub ai_preferred_skills: Vec<String>,
    pub ai_industry: Vec<String>,
    pub ai_job_function: Option<String>,
    pub ai_job_level: Vec<String>,
    pub ai_city: Option<String>,
    pub ai_state: Option<String>,
    pub ai_country: Option<String>,
    pub ai_work_arrangement: Option<WorkArrangement>,
    pub ai_remote_allowed: Option<bool>,
    pub ai_salary_min: Option<i64>,
    pub ai_salary_max: Option<i64>,
    pub ai_salary_currency: Option<String>,
    pub ai_years_experience_min: Option<i32>,
    pub ai_years_experience_max: Option<i32>,
    pub ai_summary: Option<String>,
    pub ai_enhanced: bool,

    pub embedding: Option<Vector>,
    pub embedding_text: Option<String>,
    pub embedding_version: Option<i32>,
    pub embedding_updated_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A matching candidate with its cosine similarity, from vector search.
#[derive(Debug, Clone)]
pub struct SimilarPosting {
    pub posting: CanonicalPosting,
    pub similarity: f64,
}

impl CanonicalPosting {
    /// Insert a freshly enriched posting; the id comes back assigned
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO canonical_postings (
                raw_id, source, title, company, location, job_url, description,
                employment_type, salary_min, salary_max, salary_currency,
                posted_date, scraped_at,
                ai_job_titles, ai_required_skills, ai_preferred_skills,
                ai_industry, ai_job_function, ai_job_level,
                ai_city, ai_state, ai_country, ai_work_arrangement,
                ai_remote_allowed, ai_salary_min, ai_salary_max,
                ai_salary_currency, ai_years_experience_min,
                ai_years_experience_max, ai_summary, ai_enhanced
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24,
                    $25, $26, $27, $28, $29, $30, $31)
            RETURNING *
            "#,
        )
        .bind(self.raw_id)
        .bind(&self.source)
        .bind(&self.title)
        .bind(&self.company)
        .bind(&self.location)
        .bind(&self.job_url)
        .bind(&self.description)
        .bind(&self.employment_type)
        .bind(self.salary_min)
        .bind(self.salary_max)
        .bind(&self.salary_currency)
        .bind(self.posted_date)
        .bind(self.scraped_at)
        .bind(&self.ai_job_titles)
        .bind(&self.ai_required_skills)
        .bind(&self.ai_preferred_skills)
        .bind(&self.ai_industry)
        .bind(&self.ai_job_function)
        .bind(&self.ai_job_level)
        .bind(&self.ai_city)
        .bind(&self.ai_state)
        .bind(&self.ai_country)
        .bind(self.ai_work_arrangement)
        .bind(self.ai_remote_allowed)
        .bind(self.ai_salary_min)
        .bind(self.ai_salary_max)
        .bind(&self.ai_salary_currency)
        .bind(self.ai_years_experience_min)
        .bind(self.ai_years_experience_max)
        .bind(&self.ai_summary)
        .bind(self.ai_enhanced)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find posting by ID
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM canonical_postings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Persist the posting's embedding; this is what flips `ai_enhanced`
    pub async fn set_embedding(
        id: i64,
        embedding: &[f32],
        source_text: &str,
        version: i32,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE canonical_postings
            SET embedding = $2,
                embedding_text = $3,
                embedding_version = $4,
                embedding_updated_at = $5,
                ai_enhanced = true
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Vector::from(embedding.to_vec()))
        .bind(source_text)
        .bind(version)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Vector search over recent postings for a user embedding.
    ///
    /// Only postings from the last 60 days with a compatible embedding
    /// version are candidates; results are ordered most similar first.
    pub async fn find_similar(
        user_embedding: &Vector,
        embedding_version: i32,
        min_similarity: f64,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<SimilarPosting>> {
        let rows: Vec<(i64, f64)> = sqlx::query_as(
            r#"
            SELECT id, 1 - (embedding <=> $1) AS similarity
            FROM canonical_postings
            WHERE embedding IS NOT NULL
              AND embedding_version = $2
              AND posted_date >= CURRENT_DATE - INTERVAL '60 days'
              AND 1 - (embedding <=> $1) >= $3
            ORDER BY embedding <=> $1
            LIMIT $4
            "#,
        )
        .bind(user_embedding)
        .bind(embedding_version)
        .bind(min_similarity)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for (id, similarity) in rows {
            if let Some(posting) = Self::find_by_id(id, pool).await? {
                results.push(SimilarPosting {
                    posting,
                    similarity,
                });
            }
        }
        Ok(results)
    }

    /// Enriched postings still waiting for a vector (back-fill input)
    pub async fn find_missing_embedding(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM canonical_postings
            WHERE embedding IS NULL
              AND posted_date >= CURRENT_DATE - INTERVAL '60 days'
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Postings whose embedding predates the cutoff (stale-refresh input)
    pub async fn find_stale_embeddings(
        cutoff: DateTime<Utc>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM canonical_postings
            WHERE embedding IS NOT NULL
              AND embedding_updated_at < $1
              AND posted_date >= CURRENT_DATE - INTERVAL '60 days'
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Remove duplicate postings, keeping the latest scrape per
    /// lowercased trimmed (title, company, location) tuple.
    ///
    /// Delivery history intentionally carries no foreign key to postings, so
    /// rows pointing at a pruned posting survive.
    pub async fn purge_duplicates(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM canonical_postings a
            USING canonical_postings b
            WHERE lower(trim(a.title)) = lower(trim(b.title))
              AND lower(trim(coalesce(a.company, ''))) = lower(trim(coalesce(b.company, '')))
              AND lower(trim(coalesce(a.location, ''))) = lower(trim(coalesce(b.location, '')))
              AND (a.scraped_at < b.scraped_at
                   OR (a.scraped_at = b.scraped_at AND a.id < b.id))
            "#,
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove postings older than `days` that never reached anyone
    pub async fn purge_undelivered_older_than(days: i64, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM canonical_postings p
            WHERE p.scraped_at < NOW() - ($1 || ' days')::interval
              AND NOT EXISTS (
                  SELECT 1 FROM delivery_history h WHERE h.posting_id = p.id
              )
            "#,
        )
        .bind(days.to_string())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Created-posting count for the metrics endpoint
    pub async fn count_total(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM canonical_postings")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Share of recent postings carrying an embedding, for metrics
    pub async fn embedding_coverage(pool: &PgPool) -> Result<f64> {
        let (with, total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE embedding IS NOT NULL),
                COUNT(*)
            FROM canonical_postings
            WHERE posted_date >= CURRENT_DATE - INTERVAL '60 days'
            "#,
        )
        .fetch_one(pool)
        .await?;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(with as f64 / total as f64 * 100.0)
    }

    /// Mean seconds from scrape to canonical insert over the last day
    pub async fn average_enrichment_latency_seconds(pool: &PgPool) -> Result<Option<f64>> {
        let (avg,): (Option<f64>,) = sqlx::query_as(
            r#"
            SELECT AVG(EXTRACT(EPOCH FROM (created_at - scraped_at)))::float8
            FROM canonical_postings
            WHERE created_at >= NOW() - INTERVAL '1 day'
            "#,
        )
        .fetch_one(pool)
        .await?;
        Ok(avg)
    }

    /// Whether this posting allows remote work, preferring inferred fields
    pub fn allows_remote(&self) -> bool {
        if self.ai_remote_allowed == Some(true) {
            return true;
        }
        if matches!(self.ai_work_arrangement, Some(WorkArrangement::Remote)) {
            return true;
        }
        if self.ai_remote_allowed.is_some() || self.ai_work_arrangement.is_some() {
            // The model classified the posting and said it is not remote
            return false;
        }
        let haystack = format!(
            "{} {} {}",
            self.title.to_lowercase(),
            self.description.as_deref().unwrap_or("").to_lowercase(),
            self.location.as_deref().unwrap_or("").to_lowercase(),
        );
        ["remote", "work from home", "wfh", "telecommute"]
            .iter()
            .any(|kw| haystack.contains(kw))
    }
}

/// Top skills for alert rendering: required first, then preferred.
pub fn top_skills(posting: &CanonicalPosting, count: usize) -> Vec<&str> {
    posting
        .ai_required_skills
        .iter()
        .chain(posting.ai_preferred_skills.iter())
        .take(count)
        .map(|s| s.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::testing::posting_fixture as sample;

    #[test]
    fn remote_detection_prefers_inferred_fields() {
        let mut posting = sample();
        posting.ai_remote_allowed = Some(false);
        posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
        posting.description = Some("remote work from home".into());
        // Model said on-site: text indicators are ignored
        assert!(!posting.allows_remote());

        posting.ai_remote_allowed = Some(true);
        assert!(posting.allows_remote());
    }

    #[test]
    fn remote_detection_falls_back_to_text() {
        let mut posting = sample();
        posting.ai_remote_allowed = None;
        posting.ai_work_arrangement = None;
        posting.description = Some("This is a work from home position".into());
        assert!(posting.allows_remote());
    }

    #[test]
    fn top_skills_merges_required_then_preferred() {
        let posting = sample();
        assert_eq!(top_skills(&posting, 3), vec!["negotiation", "crm", "excel"]);
    }
}
