//! Fixture builders for tests.

use chrono::{NaiveDate, Utc};

use crate::common::types::WorkArrangement;
use crate::domains::postings::models::CanonicalPosting;

/// A hybrid entry-level sales posting in Lagos.
pub fn posting_fixture() -> CanonicalPosting {
    CanonicalPosting {
        id: 1,
        raw_id: 1,
        source: "jobspy".into(),
        title: "Sales Executive".into(),
        company: Some("TechCorp Nigeria".into()),
        location: Some("Lagos, Nigeria".into()),
        job_url: Some("https://example.com/jobs/1".into()),
        description: Some(
            "We are hiring a sales executive in Lagos to grow our client base.".into(),
        ),
        employment_type: Some("Full-time".into()),
        salary_min: Some(220_000),
        salary_max: Some(320_000),
        salary_currency: Some("NGN".into()),
        posted_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        scraped_at: Utc::now(),
        ai_job_titles: vec![
            "Sales Executive".into(),
            "Sales Representative".into(),
            "Business Development Executive".into(),
        ],
        ai_required_skills: vec!["negotiation".into(), "crm".into()],
        ai_preferred_skills: vec!["excel".into()],
        ai_industry: vec!["Technology".into(), "Sales".into()],
        ai_job_function: Some("Sales".into()),
        ai_job_level: vec!["entry".into(), "junior".into()],
        ai_city: Some("Lagos".into()),
        ai_state: Some("Lagos".into()),
        ai_country: Some("Nigeria".into()),
        ai_work_arrangement: Some(WorkArrangement::Hybrid),
        ai_remote_allowed: Some(false),
        ai_salary_min: Some(220_000),
        ai_salary_max: Some(320_000),
        ai_salary_currency: Some("NGN".into()),
        ai_years_experience_min: Some(0),
        ai_years_experience_max: Some(2),
        ai_summary: Some("Entry level sales role at TechCorp in Lagos.".into()),
        ai_enhanced: true,
        embedding: None,
        embedding_text: None,
        embedding_version: None,
        embedding_updated_at: None,
        created_at: Utc::now(),
    }
}
