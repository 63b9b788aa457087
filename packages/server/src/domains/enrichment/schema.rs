//! Structured response schema for posting enrichment.
//!
//! The model is asked for strict JSON matching [`JobEnrichment`]; the schema
//! is derived with `schemars` and enforced provider-side, then validated
//! again here by deserialization.

use openai_client::truncate_to_char_boundary;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::types::WorkArrangement;

pub const SUMMARY_CHAR_LIMIT: usize = 280;
pub const YEARS_EXPERIENCE_CAP: i32 = 50;

/// Attributes inferred from one raw posting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobEnrichment {
    /// All titles this role matches: the exact title first, then variations
    /// and synonyms.
    pub ai_job_titles: Vec<String>,
    pub ai_required_skills: Vec<String>,
    pub ai_preferred_skills: Vec<String>,
    pub ai_industry: Vec<String>,
    pub ai_job_function: String,
    /// Every level the role fits (a posting can be entry AND junior).
    pub ai_job_level: Vec<String>,
    pub ai_city: String,
    pub ai_state: String,
    pub ai_country: String,
    pub ai_work_arrangement: WorkArrangement,
    pub ai_remote_allowed: bool,
    pub ai_salary_min: Option<i64>,
    pub ai_salary_max: Option<i64>,
    pub ai_salary_currency: Option<String>,
    pub ai_years_experience_min: Option<i32>,
    pub ai_years_experience_max: Option<i32>,
    /// Short chat-optimized summary, at most 280 characters.
    pub ai_summary: String,
}

impl JobEnrichment {
    /// Normalize numeric semantics after deserialization:
    /// - single-sided salary ranges are mirrored
    /// - salary currency defaults to the source region's currency (NGN)
    /// - years of experience clamp to [0, 50], min <= max
    /// - over-length summaries are trimmed at a char boundary
    pub fn normalize(mut self) -> Self {
        match (self.ai_salary_min, self.ai_salary_max) {
            (Some(min), None) => self.ai_salary_max = Some(min),
            (None, Some(max)) => self.ai_salary_min = Some(max),
            _ => {}
        }
        if (self.ai_salary_min.is_some() || self.ai_salary_max.is_some())
            && self.ai_salary_currency.is_none()
        {
            self.ai_salary_currency = Some("NGN".to_string());
        }

        let clamp = |v: i32| v.clamp(0, YEARS_EXPERIENCE_CAP);
        self.ai_years_experience_min = self.ai_years_experience_min.map(clamp);
        self.ai_years_experience_max = self.ai_years_experience_max.map(clamp);
        if let (Some(min), Some(max)) = (self.ai_years_experience_min, self.ai_years_experience_max)
        {
            if min > max {
                self.ai_years_experience_min = Some(max);
                self.ai_years_experience_max = Some(min);
            }
        }

        if self.ai_summary.chars().count() > SUMMARY_CHAR_LIMIT {
            let byte_limit = self
                .ai_summary
                .char_indices()
                .nth(SUMMARY_CHAR_LIMIT)
                .map(|(i, _)| i)
                .unwrap_or(self.ai_summary.len());
            self.ai_summary = truncate_to_char_boundary(&self.ai_summary, byte_limit).to_string();
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_client::StructuredOutput;

    fn minimal() -> JobEnrichment {
        serde_json::from_value(serde_json::json!({
            "ai_job_titles": ["Sales Executive"],
            "ai_required_skills": [],
            "ai_preferred_skills": [],
            "ai_industry": [],
            "ai_job_function": "Sales",
            "ai_job_level": ["entry"],
            "ai_city": "Lagos",
            "ai_state": "Lagos",
            "ai_country": "Nigeria",
            "ai_work_arrangement": "hybrid",
            "ai_remote_allowed": false,
            "ai_salary_min": null,
            "ai_salary_max": null,
            "ai_salary_currency": null,
            "ai_years_experience_min": null,
            "ai_years_experience_max": null,
            "ai_summary": "Entry level sales role."
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_spec_shape() {
        let enrichment = minimal();
        assert_eq!(enrichment.ai_job_titles, vec!["Sales Executive"]);
        assert_eq!(enrichment.ai_work_arrangement, WorkArrangement::Hybrid);
    }

    #[test]
    fn rejects_unknown_arrangement() {
        let result: Result<JobEnrichment, _> = serde_json::from_value(serde_json::json!({
            "ai_job_titles": [], "ai_required_skills": [], "ai_preferred_skills": [],
            "ai_industry": [], "ai_job_function": "", "ai_job_level": [],
            "ai_city": "", "ai_state": "", "ai_country": "",
            "ai_work_arrangement": "underwater", "ai_remote_allowed": false,
            "ai_summary": ""
        }));
        assert!(result.is_err());
    }

    #[test]
    fn single_sided_salary_is_mirrored() {
        let mut enrichment = minimal();
        enrichment.ai_salary_min = Some(250_000);
        let normalized = enrichment.normalize();
        assert_eq!(normalized.ai_salary_max, Some(250_000));
        assert_eq!(normalized.ai_salary_currency.as_deref(), Some("NGN"));
    }

    #[test]
    fn years_clamp_and_order() {
        let mut enrichment = minimal();
        enrichment.ai_years_experience_min = Some(80);
        enrichment.ai_years_experience_max = Some(-3);
        let normalized = enrichment.normalize();
        assert_eq!(normalized.ai_years_experience_min, Some(0));
        assert_eq!(normalized.ai_years_experience_max, Some(50));
    }

    #[test]
    fn overlong_summary_is_trimmed() {
        let mut enrichment = minimal();
        enrichment.ai_summary = "x".repeat(500);
        let normalized = enrichment.normalize();
        assert_eq!(normalized.ai_summary.chars().count(), SUMMARY_CHAR_LIMIT);
    }

    #[test]
    fn schema_denies_additional_properties() {
        let schema = JobEnrichment::openai_schema();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.contains("\"additionalProperties\":false"));
    }
}
