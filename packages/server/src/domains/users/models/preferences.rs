use anyhow::Result;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::common::types::{EmploymentType, ExperienceLevel, WorkArrangement};

/// Job-search preferences, 0..1 per user.
///
/// A closed, versioned schema: the conversational front-end hands over a
/// JSON document, unknown fields are dropped at the boundary with a warning
/// (see [`PreferenceDocument::parse`]). Optional numerics are nullable, not
/// sentinel-zero.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub job_roles: Vec<String>,
    pub job_categories: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub willing_to_relocate: bool,
    pub work_arrangements: Vec<WorkArrangement>,
    pub employment_types: Vec<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub years_of_experience: Option<i32>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub required_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub industries: Vec<String>,
    pub company_sizes: Vec<String>,
    pub confirmed: bool,
    pub embedding: Option<Vector>,
    pub embedding_text: Option<String>,
    pub embedding_version: Option<i32>,
    pub embedding_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The mutable subset of preference fields, as accepted at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceDocument {
    pub job_roles: Vec<String>,
    pub job_categories: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub willing_to_relocate: bool,
    pub work_arrangements: Vec<WorkArrangement>,
    pub employment_types: Vec<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub years_of_experience: Option<i32>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub required_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub industries: Vec<String>,
    pub company_sizes: Vec<String>,
    pub confirmed: bool,
}

impl PreferenceDocument {
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "job_roles",
        "job_categories",
        "preferred_locations",
        "location_city",
        "location_state",
        "location_country",
        "willing_to_relocate",
        "work_arrangements",
        "employment_types",
        "experience_level",
        "years_of_experience",
        "salary_min",
        "salary_max",
        "salary_currency",
        "salary_period",
        "required_skills",
        "soft_skills",
        "industries",
        "company_sizes",
        "confirmed",
    ];

    /// Parse a preference document, dropping unknown fields.
    ///
    /// Returns the parsed document plus the names of the dropped fields so
    /// the caller can surface a structured warning.
    pub fn parse(value: serde_json::Value) -> Result<(Self, Vec<String>)> {
        let unknown: Vec<String> = value
            .as_object()
            .map(|map| {
                map.keys()
                    .filter(|k| !Self::KNOWN_FIELDS.contains(&k.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut trimmed = value;
        if let Some(map) = trimmed.as_object_mut() {
            for key in &unknown {
                map.remove(key);
            }
        }

        if !unknown.is_empty() {
            warn!(dropped_fields = ?unknown, "dropping unknown preference fields");
        }

        let document: Self = serde_json::from_value(trimmed)?;
        Ok((document, unknown))
    }
}

impl UserPreferences {
    /// Find preferences for a user
    pub async fn find_by_user(user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert or replace the preference row for a user
    pub async fn upsert(user_id: Uuid, doc: &PreferenceDocument, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_preferences (
                user_id, job_roles, job_categories, preferred_locations,
                location_city, location_state, location_country, willing_to_relocate,
                work_arrangements, employment_types, experience_level,
                years_of_experience, salary_min, salary_max, salary_currency,
                salary_period, required_skills, soft_skills, industries,
                company_sizes, confirmed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21)
            ON CONFLICT (user_id) DO UPDATE SET
                job_roles = EXCLUDED.job_roles,
                job_categories = EXCLUDED.job_categories,
                preferred_locations = EXCLUDED.preferred_locations,
                location_city = EXCLUDED.location_city,
                location_state = EXCLUDED.location_state,
                location_country = EXCLUDED.location_country,
                willing_to_relocate = EXCLUDED.willing_to_relocate,
                work_arrangements = EXCLUDED.work_arrangements,
                employment_types = EXCLUDED.employment_types,
                experience_level = EXCLUDED.experience_level,
                years_of_experience = EXCLUDED.years_of_experience,
                salary_min = EXCLUDED.salary_min,
                salary_max = EXCLUDED.salary_max,
                salary_currency = EXCLUDED.salary_currency,
                salary_period = EXCLUDED.salary_period,
                required_skills = EXCLUDED.required_skills,
                soft_skills = EXCLUDED.soft_skills,
                industries = EXCLUDED.industries,
                company_sizes = EXCLUDED.company_sizes,
                confirmed = EXCLUDED.confirmed,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&doc.job_roles)
        .bind(&doc.job_categories)
        .bind(&doc.preferred_locations)
        .bind(&doc.location_city)
        .bind(&doc.location_state)
        .bind(&doc.location_country)
        .bind(doc.willing_to_relocate)
        .bind(&doc.work_arrangements)
        .bind(&doc.employment_types)
        .bind(doc.experience_level)
        .bind(doc.years_of_experience)
        .bind(doc.salary_min)
        .bind(doc.salary_max)
        .bind(&doc.salary_currency)
        .bind(&doc.salary_period)
        .bind(&doc.required_skills)
        .bind(&doc.soft_skills)
        .bind(&doc.industries)
        .bind(&doc.company_sizes)
        .bind(doc.confirmed)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Persist a freshly generated user embedding
    pub async fn set_embedding(
        user_id: Uuid,
        embedding: &[f32],
        source_text: &str,
        version: i32,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_preferences
            SET embedding = $2,
                embedding_text = $3,
                embedding_version = $4,
                embedding_updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(Vector::from(embedding.to_vec()))
        .bind(source_text)
        .bind(version)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Users whose preferences have no embedding yet (back-fill input)
    pub async fn find_missing_embedding(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM user_preferences WHERE embedding IS NULL LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Users whose embedding predates the cutoff (stale-refresh input)
    pub async fn find_stale_embeddings(
        cutoff: DateTime<Utc>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM user_preferences
            WHERE embedding IS NOT NULL AND embedding_updated_at < $1
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Share of confirmed users carrying an embedding, for metrics
    pub async fn embedding_coverage(pool: &PgPool) -> Result<f64> {
        let (with, total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE embedding IS NOT NULL),
                COUNT(*)
            FROM user_preferences
            "#,
        )
        .fetch_one(pool)
        .await?;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(with as f64 / total as f64 * 100.0)
    }
}
