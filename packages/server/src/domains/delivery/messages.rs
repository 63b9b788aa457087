//! Outbound message templates. Text-only, emoji-permitted, line-break
//! formatted for chat.

use crate::domains::postings::models::{top_skills, CanonicalPosting};
use crate::domains::users::models::UserPreferences;

/// Render a job alert.
///
/// Header carries the match percent; body carries title/company, salary,
/// location, experience, top skills, then the chat summary and apply URL
/// when present.
pub fn job_alert(posting: &CanonicalPosting, score: f64, reasons: &[String]) -> String {
    let mut message = format!("🚨 *NEW JOB ALERT!* ({:.0}% match)\n\n", score);

    message.push_str(&format!(
        "**{}** at **{}**\n",
        posting.title,
        posting.company.as_deref().unwrap_or("Company")
    ));

    let salary_min = posting.ai_salary_min.or(posting.salary_min);
    let salary_max = posting.ai_salary_max.or(posting.salary_max);
    let currency = posting
        .ai_salary_currency
        .as_deref()
        .or(posting.salary_currency.as_deref())
        .unwrap_or("NGN");
    match (salary_min, salary_max) {
        (Some(min), Some(max)) if min != max => {
            message.push_str(&format!("💰 {} - {} {}/month\n", min, max, currency));
        }
        (Some(min), _) => {
            message.push_str(&format!("💰 {} {}/month\n", min, currency));
        }
        (None, Some(max)) => {
            message.push_str(&format!("💰 up to {} {}/month\n", max, currency));
        }
        (None, None) => {}
    }

    let location = match (posting.ai_city.as_deref(), posting.ai_state.as_deref()) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        _ => posting
            .location
            .clone()
            .unwrap_or_else(|| "Location not specified".to_string()),
    };
    message.push_str(&format!("📍 {}\n", location));

    match (
        posting.ai_years_experience_min,
        posting.ai_years_experience_max,
    ) {
        (Some(min), Some(max)) if min != max => {
            message.push_str(&format!("⏱️ {}-{} years experience\n", min, max));
        }
        (Some(min), _) if min > 0 => {
            message.push_str(&format!("⏱️ {}+ years experience\n", min));
        }
        _ => {}
    }

    let skills = top_skills(posting, 5);
    if !skills.is_empty() {
        message.push_str(&format!("🎯 {}\n", skills.join(", ")));
    }

    if let Some(summary) = posting.ai_summary.as_deref() {
        message.push_str(&format!("\n{}\n", summary));
    }

    if !reasons.is_empty() {
        message.push_str(&format!("\n✨ {}\n", reasons.join(". ")));
    }

    if let Some(url) = posting.job_url.as_deref() {
        message.push_str(&format!("\n🔗 Apply: {}", url));
    }

    message
}

/// First-contact greeting for users with no preferences yet.
pub fn welcome() -> String {
    "👋 *Welcome to your job search assistant!*\n\n\
     I watch Nigerian job boards around the clock and send you matching \
     roles the moment they appear.\n\n\
     Tell me what you're looking for to get started - for example:\n\
     _\"I'm a sales executive in Lagos looking for hybrid roles paying \
     at least ₦200k\"_"
        .to_string()
}

/// Echo the stored preferences and close with a yes/no prompt.
pub fn preference_confirmation(prefs: &UserPreferences) -> String {
    let mut lines = vec!["📋 *Here's what I have:*".to_string(), String::new()];

    if !prefs.job_roles.is_empty() {
        lines.push(format!("💼 Roles: {}", prefs.job_roles.join(", ")));
    }
    if !prefs.preferred_locations.is_empty() {
        lines.push(format!("📍 Locations: {}", prefs.preferred_locations.join(", ")));
    }
    if !prefs.work_arrangements.is_empty() {
        let labels: Vec<&str> = prefs.work_arrangements.iter().map(|a| a.label()).collect();
        lines.push(format!("🏢 Arrangements: {}", labels.join(", ")));
    }
    if let Some(level) = prefs.experience_level {
        lines.push(format!("📈 Level: {}", level.label()));
    }
    if let Some(years) = prefs.years_of_experience {
        lines.push(format!("⏱️ Experience: {} years", years));
    }
    if let Some(min) = prefs.salary_min {
        let currency = prefs.salary_currency.as_deref().unwrap_or("NGN");
        match prefs.salary_max {
            Some(max) => lines.push(format!("💰 Salary: {} {} - {}", currency, min, max)),
            None => lines.push(format!("💰 Minimum salary: {} {}", currency, min)),
        }
    }
    if !prefs.required_skills.is_empty() {
        lines.push(format!("🎯 Skills: {}", prefs.required_skills.join(", ")));
    }

    lines.push(String::new());
    lines.push("Is this correct? Reply *yes* to start receiving alerts, or tell me what to change.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::testing::posting_fixture;
    use crate::domains::users::testing::preferences_fixture;

    #[test]
    fn alert_carries_match_percent_and_title() {
        let posting = posting_fixture();
        let message = job_alert(&posting, 87.4, &[]);
        assert!(message.starts_with("🚨 *NEW JOB ALERT!* (87% match)"));
        assert!(message.contains("**Sales Executive** at **TechCorp Nigeria**"));
    }

    #[test]
    fn alert_renders_salary_location_skills_and_url() {
        let posting = posting_fixture();
        let message = job_alert(&posting, 90.0, &[]);
        assert!(message.contains("💰 220000 - 320000 NGN/month"));
        assert!(message.contains("📍 Lagos, Lagos"));
        assert!(message.contains("🎯 negotiation, crm, excel"));
        assert!(message.contains("🔗 Apply: https://example.com/jobs/1"));
    }

    #[test]
    fn alert_omits_missing_salary() {
        let mut posting = posting_fixture();
        posting.salary_min = None;
        posting.salary_max = None;
        posting.ai_salary_min = None;
        posting.ai_salary_max = None;
        let message = job_alert(&posting, 55.0, &[]);
        assert!(!message.contains("💰"));
    }

    #[test]
    fn alert_includes_reasons_when_present() {
        let posting = posting_fixture();
        let reasons = vec!["semantic similarity: 91%".to_string()];
        let message = job_alert(&posting, 91.0, &reasons);
        assert!(message.contains("✨ semantic similarity: 91%"));
    }

    #[test]
    fn confirmation_echoes_preferences_and_asks() {
        let prefs = preferences_fixture();
        let message = preference_confirmation(&prefs);
        assert!(message.contains("💼 Roles: sales executive"));
        assert!(message.contains("📍 Locations: Lagos"));
        assert!(message.contains("Reply *yes*"));
    }

    #[test]
    fn welcome_prompts_for_preferences() {
        assert!(welcome().contains("Tell me what you're looking for"));
    }
}
