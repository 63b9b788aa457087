//! Profile text generators: the deterministic inputs to embedding.
//!
//! Both functions are pure and assemble their sentences in a FIXED order
//! with empty components omitted, so equal preferences yield equal text and
//! therefore equal vectors. Reordering these sections silently invalidates
//! every cached and stored embedding; bump the embedding version instead.

use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::UserPreferences;

const DESCRIPTION_SNIPPET_LIMIT: usize = 300;

/// Render a user's preferences as embedding source text.
pub fn user_profile_text(prefs: &UserPreferences) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !prefs.job_roles.is_empty() {
        parts.push(format!("Seeking roles: {}", prefs.job_roles.join(", ")));
    }
    if !prefs.job_categories.is_empty() {
        parts.push(format!(
            "Job categories: {}",
            prefs.job_categories.join(", ")
        ));
    }

    if let Some(level) = prefs.experience_level {
        parts.push(format!("Experience level: {}", level.label()));
    }
    if let Some(years) = prefs.years_of_experience {
        if years > 0 {
            parts.push(format!("Years of experience: {}", years));
        }
    }

    if !prefs.required_skills.is_empty() {
        parts.push(format!(
            "Technical skills: {}",
            prefs.required_skills.join(", ")
        ));
    }
    if !prefs.soft_skills.is_empty() {
        parts.push(format!("Soft skills: {}", prefs.soft_skills.join(", ")));
    }

    if !prefs.preferred_locations.is_empty() {
        parts.push(format!(
            "Preferred locations: {}",
            prefs.preferred_locations.join(", ")
        ));
    }
    if prefs.willing_to_relocate {
        parts.push("Open to relocation".to_string());
    }

    if !prefs.work_arrangements.is_empty() {
        let labels: Vec<&str> = prefs.work_arrangements.iter().map(|a| a.label()).collect();
        parts.push(format!("Work arrangements: {}", labels.join(", ")));
    }
    if !prefs.employment_types.is_empty() {
        let labels: Vec<&str> = prefs.employment_types.iter().map(|t| t.label()).collect();
        parts.push(format!("Employment types: {}", labels.join(", ")));
    }

    let currency = prefs.salary_currency.as_deref().unwrap_or("NGN");
    match (prefs.salary_min, prefs.salary_max) {
        (Some(min), Some(max)) => {
            parts.push(format!("Salary expectation: {} {} - {}", currency, min, max));
        }
        (Some(min), None) => {
            parts.push(format!("Minimum salary: {} {}", currency, min));
        }
        _ => {}
    }

    if !prefs.company_sizes.is_empty() {
        parts.push(format!(
            "Company size preference: {}",
            prefs.company_sizes.join(", ")
        ));
    }
    if !prefs.industries.is_empty() {
        parts.push(format!("Industry interests: {}", prefs.industries.join(", ")));
    }

    if parts.is_empty() {
        "Job seeker".to_string()
    } else {
        parts.join(". ")
    }
}

/// Render a canonical posting as embedding source text.
pub fn job_profile_text(posting: &CanonicalPosting) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("Job title: {}", posting.title));
    if let Some(company) = non_empty(&posting.company) {
        parts.push(format!("Company: {}", company));
    }

    if !posting.ai_job_titles.is_empty() {
        parts.push(format!(
            "Job variations: {}",
            posting.ai_job_titles.join(", ")
        ));
    }
    if let Some(function) = non_empty(&posting.ai_job_function) {
        parts.push(format!("Job function: {}", function));
    }
    if !posting.ai_job_level.is_empty() {
        parts.push(format!("Job level: {}", posting.ai_job_level.join(", ")));
    }
    if !posting.ai_industry.is_empty() {
        parts.push(format!("Industry: {}", posting.ai_industry.join(", ")));
    }

    match (non_empty(&posting.ai_city), non_empty(&posting.ai_state)) {
        (Some(city), Some(state)) => parts.push(format!("Location: {}, {}", city, state)),
        _ => {
            if let Some(location) = non_empty(&posting.location) {
                parts.push(format!("Location: {}", location));
            }
        }
    }
    if let Some(country) = non_empty(&posting.ai_country) {
        parts.push(format!("Country: {}", country));
    }

    if let Some(arrangement) = posting.ai_work_arrangement {
        parts.push(format!("Work arrangement: {}", arrangement.label()));
    }
    if posting.ai_remote_allowed == Some(true) {
        parts.push("Remote work allowed".to_string());
    }

    if !posting.ai_required_skills.is_empty() {
        parts.push(format!(
            "Required skills: {}",
            posting.ai_required_skills.join(", ")
        ));
    }
    if !posting.ai_preferred_skills.is_empty() {
        parts.push(format!(
            "Preferred skills: {}",
            posting.ai_preferred_skills.join(", ")
        ));
    }

    match (
        posting.ai_years_experience_min,
        posting.ai_years_experience_max,
    ) {
        (Some(min), Some(max)) if max > 0 => {
            parts.push(format!("Experience required: {}-{} years", min, max));
        }
        (Some(min), _) if min > 0 => {
            parts.push(format!("Minimum experience: {} years", min));
        }
        _ => {}
    }

    let currency = posting
        .ai_salary_currency
        .as_deref()
        .or(posting.salary_currency.as_deref())
        .unwrap_or("");
    match (posting.ai_salary_min, posting.ai_salary_max) {
        (Some(min), Some(max)) => {
            parts.push(format!("Salary: {} {} - {}", currency, min, max).trim().to_string());
        }
        (Some(min), None) => {
            parts.push(format!("Minimum salary: {} {}", currency, min).trim().to_string());
        }
        _ => {}
    }

    if let Some(summary) = non_empty(&posting.ai_summary) {
        parts.push(format!("Summary: {}", summary));
    } else if let Some(description) = non_empty(&posting.description) {
        let snippet = snippet(description, DESCRIPTION_SNIPPET_LIMIT);
        parts.push(format!("Description: {}", snippet));
    }

    if parts.is_empty() {
        "Job posting".to_string()
    } else {
        parts.join(". ")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn snippet(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::testing::posting_fixture;
    use crate::domains::users::testing::preferences_fixture;

    #[test]
    fn equal_preferences_render_identical_text() {
        let a = preferences_fixture();
        let b = preferences_fixture();
        assert_eq!(user_profile_text(&a), user_profile_text(&b));
    }

    #[test]
    fn user_profile_sections_are_ordered() {
        let text = user_profile_text(&preferences_fixture());
        let roles = text.find("Seeking roles").unwrap();
        let skills = text.find("Technical skills").unwrap();
        let locations = text.find("Preferred locations").unwrap();
        let salary = text.find("Minimum salary").unwrap();
        assert!(roles < skills && skills < locations && locations < salary);
    }

    #[test]
    fn empty_components_are_omitted() {
        let mut prefs = preferences_fixture();
        prefs.soft_skills.clear();
        prefs.company_sizes.clear();
        let text = user_profile_text(&prefs);
        assert!(!text.contains("Soft skills"));
        assert!(!text.contains("Company size"));
    }

    #[test]
    fn blank_preferences_render_placeholder() {
        let mut prefs = preferences_fixture();
        prefs.job_roles.clear();
        prefs.job_categories.clear();
        prefs.preferred_locations.clear();
        prefs.work_arrangements.clear();
        prefs.employment_types.clear();
        prefs.required_skills.clear();
        prefs.soft_skills.clear();
        prefs.industries.clear();
        prefs.company_sizes.clear();
        prefs.experience_level = None;
        prefs.years_of_experience = None;
        prefs.salary_min = None;
        prefs.salary_max = None;
        prefs.willing_to_relocate = false;
        assert_eq!(user_profile_text(&prefs), "Job seeker");
    }

    #[test]
    fn job_profile_prefers_summary_over_description() {
        let posting = posting_fixture();
        let text = job_profile_text(&posting);
        assert!(text.contains("Summary: Entry level sales role"));
        assert!(!text.contains("Description:"));
    }

    #[test]
    fn job_description_snippet_is_bounded() {
        let mut posting = posting_fixture();
        posting.ai_summary = None;
        posting.description = Some("x".repeat(1000));
        let text = job_profile_text(&posting);
        let description = text.split("Description: ").nth(1).unwrap();
        assert!(description.chars().count() <= DESCRIPTION_SNIPPET_LIMIT + 3);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn job_location_prefers_normalized_city_state() {
        let posting = posting_fixture();
        let text = job_profile_text(&posting);
        assert!(text.contains("Location: Lagos, Lagos"));
    }
}
