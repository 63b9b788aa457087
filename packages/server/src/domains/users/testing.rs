//! Fixture builders for tests.

use chrono::Utc;
use uuid::Uuid;

use crate::common::types::{EmploymentType, ExperienceLevel, WorkArrangement};
use crate::domains::users::models::{User, UserPreferences};

/// An active user with a stable id.
pub fn user_fixture() -> User {
    User {
        id: Uuid::new_v4(),
        phone_number: "2348012345678".into(),
        name: Some("Ada".into()),
        is_active: true,
        created_at: Utc::now(),
        last_active: Utc::now(),
    }
}

/// Confirmed preferences for an entry-level sales seeker in Lagos.
pub fn preferences_fixture() -> UserPreferences {
    UserPreferences {
        user_id: Uuid::new_v4(),
        job_roles: vec!["sales executive".into()],
        job_categories: vec!["sales".into()],
        preferred_locations: vec!["Lagos".into()],
        location_city: Some("Lagos".into()),
        location_state: Some("Lagos".into()),
        location_country: Some("Nigeria".into()),
        willing_to_relocate: false,
        work_arrangements: vec![WorkArrangement::Hybrid],
        employment_types: vec![EmploymentType::FullTime],
        experience_level: Some(ExperienceLevel::Entry),
        years_of_experience: Some(0),
        salary_min: Some(200_000),
        salary_max: None,
        salary_currency: Some("NGN".into()),
        salary_period: Some("monthly".into()),
        required_skills: vec!["negotiation".into()],
        soft_skills: vec!["communication".into()],
        industries: vec!["Technology".into()],
        company_sizes: vec![],
        confirmed: true,
        embedding: None,
        embedding_text: None,
        embedding_version: None,
        embedding_updated_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
