//! Rule matcher: the fallback scorer when either side lacks an embedding.
//!
//! Location is a hard filter (see `location.rs`); every other factor
//! contributes to a weighted sum clipped at 100:
//!
//! | factor           | max |
//! |------------------|-----|
//! | alternate titles | 35  |
//! | work arrangement | 20  |
//! | salary           | 20  |
//! | experience       | 10  |
//! | job function     | 7   |
//! | industry         | 5   |
//! | skills           | 20  |
//! | semantic cluster | 5   |

use strsim::jaro_winkler;
use tracing::warn;

use crate::common::types::{ExperienceLevel, WorkArrangement};
use crate::domains::matching::currency::{conversion_factor, currencies_related};
use crate::domains::matching::location::is_location_compatible;
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::UserPreferences;

const TITLE_MAX: f64 = 35.0;
const ARRANGEMENT_MAX: f64 = 20.0;
const SALARY_MAX: f64 = 20.0;
const EXPERIENCE_MAX: f64 = 10.0;
const FUNCTION_MAX: f64 = 7.0;
const INDUSTRY_MAX: f64 = 5.0;
const SKILLS_MAX: f64 = 20.0;
const CLUSTER_MAX: f64 = 5.0;

/// A scored match with one reason sentence per strong factor.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Score a posting for a user. `None` means the location filter excluded it.
pub fn score_posting(prefs: &UserPreferences, posting: &CanonicalPosting) -> Option<RuleMatch> {
    if !is_location_compatible(prefs, posting) {
        return None;
    }

    let mut reasons = Vec::new();
    let mut total = 0.0;

    let factors: [(f64, f64, String); 8] = [
        (
            score_titles(prefs, posting),
            TITLE_MAX,
            format!("Role matches your interest in {}", join_or(&prefs.job_roles, "this field")),
        ),
        (
            score_arrangement(prefs, posting),
            ARRANGEMENT_MAX,
            arrangement_reason(posting),
        ),
        (
            score_salary(prefs, posting),
            SALARY_MAX,
            "Salary range fits your expectations".to_string(),
        ),
        (
            score_experience(prefs, posting),
            EXPERIENCE_MAX,
            "Experience requirements fit your background".to_string(),
        ),
        (
            score_function(prefs, posting),
            FUNCTION_MAX,
            format!(
                "Job function is {}",
                posting.ai_job_function.as_deref().unwrap_or("a fit")
            ),
        ),
        (
            score_industry(prefs, posting),
            INDUSTRY_MAX,
            format!("Industry matches {}", join_or(&prefs.industries, "your interests")),
        ),
        (
            score_skills(prefs, posting),
            SKILLS_MAX,
            "Your skills match the requirements".to_string(),
        ),
        (
            score_cluster(prefs, posting),
            CLUSTER_MAX,
            "Related field to your preferences".to_string(),
        ),
    ];

    for (score, max, reason) in factors {
        total += score;
        if score >= max * 0.5 {
            reasons.push(reason);
        }
    }

    Some(RuleMatch {
        score: total.min(100.0),
        reasons,
    })
}

fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

fn arrangement_reason(posting: &CanonicalPosting) -> String {
    match posting.ai_work_arrangement {
        Some(arrangement) => format!("{} work available", arrangement.label()),
        None if posting.allows_remote() => "Remote work available".to_string(),
        None => "Work arrangement fits".to_string(),
    }
}

// =============================================================================
// Titles (35)
// =============================================================================

const SALES_TERMS: &[&str] = &[
    "manager",
    "executive",
    "supervisor",
    "representative",
    "associate",
    "specialist",
    "coordinator",
    "lead",
];

/// Category keywords used when roles themselves don't match.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["developer", "engineer", "programmer", "software", "tech", "it", "data", "analyst", "devops", "qa"],
    ),
    (
        "healthcare",
        &["nurse", "doctor", "medical", "health", "clinical", "pharmacy", "therapy"],
    ),
    (
        "finance",
        &["financial", "accounting", "analyst", "banker", "investment", "audit", "controller"],
    ),
    (
        "marketing",
        &["marketing", "digital", "social media", "content", "brand", "campaign", "seo"],
    ),
    (
        "sales",
        &["sales", "business development", "account", "relationship", "revenue"],
    ),
    (
        "design",
        &["designer", "ui", "ux", "graphic", "creative", "visual", "art"],
    ),
    (
        "education",
        &["teacher", "instructor", "professor", "tutor", "education", "training"],
    ),
    (
        "operations",
        &["operations", "logistics", "supply chain", "process", "coordinator"],
    ),
    (
        "human resources",
        &["hr", "human resources", "recruiter", "talent", "people"],
    ),
    (
        "customer service",
        &["customer", "support", "service", "help desk", "call center"],
    ),
];

fn score_titles(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    if prefs.job_roles.is_empty() && prefs.job_categories.is_empty() {
        return 0.0;
    }

    let ai_titles: Vec<String> = posting
        .ai_job_titles
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let job_title = posting.title.to_lowercase();

    let mut best: f64 = 0.0;

    // Exact substring against the alternate-title array
    for role in &prefs.job_roles {
        let role = role.to_lowercase();
        if role.is_empty() {
            continue;
        }
        if ai_titles.iter().any(|t| t.contains(&role)) {
            return TITLE_MAX;
        }
    }

    // Fuzzy against the alternate-title array; sales-family titles score on
    // role-term co-occurrence before string distance
    for role in &prefs.job_roles {
        let role = role.to_lowercase();
        for title in &ai_titles {
            if role.contains("sales") && title.contains("sales") {
                let user_term = SALES_TERMS.iter().any(|t| role.contains(t));
                let job_term = SALES_TERMS.iter().any(|t| title.contains(t));
                if user_term && job_term {
                    best = best.max(32.0);
                } else {
                    best = best.max(30.0);
                }
            }

            let similarity = jaro_winkler(&role, title);
            if similarity > 0.92 {
                best = best.max(30.0);
            } else if similarity > 0.85 {
                best = best.max(25.0);
            } else if similarity > 0.78 && role.contains("sales") {
                best = best.max(22.0);
            }
        }
    }

    // Category-level keywords
    if best < 30.0 {
        for category in &prefs.job_categories {
            let category = category.to_lowercase();
            let keywords = CATEGORY_KEYWORDS
                .iter()
                .find(|(name, _)| *name == category)
                .map(|(_, kws)| *kws);

            let hit = match keywords {
                Some(kws) => {
                    ai_titles
                        .iter()
                        .any(|t| kws.iter().any(|kw| t.contains(kw)))
                        || kws.iter().any(|kw| job_title.contains(kw))
                }
                None => {
                    ai_titles.iter().any(|t| t.contains(&category))
                        || job_title.contains(&category)
                }
            };
            if hit {
                best = best.max(20.0);
            }
        }
    }

    // Original title fallback
    if best < 20.0 {
        for role in &prefs.job_roles {
            if job_title.contains(&role.to_lowercase()) {
                best = best.max(15.0);
            }
        }
    }

    // Loose keyword fallback: any word of a desired role appearing in the title
    if best < 15.0 {
        for role in &prefs.job_roles {
            let matched = role
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.len() > 3)
                .any(|w| job_title.contains(w) || ai_titles.iter().any(|t| t.contains(w)));
            if matched {
                best = best.max(10.0);
            }
        }
    }

    best
}

// =============================================================================
// Work arrangement (20)
// =============================================================================

fn score_arrangement(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    if prefs.work_arrangements.is_empty() {
        return 0.0;
    }

    let inferred = posting.ai_work_arrangement;
    let remote_allowed = posting.allows_remote();

    let mut best: f64 = 0.0;
    for arrangement in &prefs.work_arrangements {
        let score = match arrangement {
            // Hybrid-preferring users accept a broader range: 18 for any
            // classified posting, 20 only on the exact match
            WorkArrangement::Hybrid => match inferred {
                Some(WorkArrangement::Hybrid) => 20.0,
                Some(_) => 18.0,
                None if remote_allowed => 16.0,
                None => 14.0,
            },
            WorkArrangement::Remote => {
                if matches!(inferred, Some(WorkArrangement::Remote)) || remote_allowed {
                    20.0
                } else {
                    0.0
                }
            }
            WorkArrangement::OnSite => match inferred {
                Some(WorkArrangement::OnSite) => 20.0,
                Some(_) => 0.0,
                // Unclassified and no remote hints: on-site is the default
                None if !remote_allowed => 14.0,
                None => 0.0,
            },
        };
        best = best.max(score);
    }
    best
}

// =============================================================================
// Salary (20)
// =============================================================================

fn score_salary(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    if prefs.salary_min.is_none() && prefs.salary_max.is_none() && prefs.salary_currency.is_none()
    {
        return 0.0;
    }

    // Prefer inferred salary fields over the raw ones
    let job_currency = posting
        .ai_salary_currency
        .as_deref()
        .or(posting.salary_currency.as_deref());
    let mut job_min = posting.ai_salary_min.or(posting.salary_min).map(|v| v as f64);
    let mut job_max = posting.ai_salary_max.or(posting.salary_max).map(|v| v as f64);

    // Missing job salary gets the fair baseline so salary-silent postings
    // (the majority) are not penalized into oblivion
    if job_currency.is_none() && job_min.is_none() && job_max.is_none() {
        return 10.0;
    }

    let user_min = prefs.salary_min.map(|v| v as f64);
    let user_max = prefs.salary_max.map(|v| v as f64);

    let mut score = 0.0;

    if let (Some(user_currency), Some(job_currency)) =
        (prefs.salary_currency.as_deref(), job_currency)
    {
        match conversion_factor(job_currency, user_currency) {
            Some(factor) if factor == 1.0 => score += 4.0,
            Some(factor) => {
                score += if currencies_related(user_currency, job_currency) {
                    2.0
                } else {
                    0.0
                };
                job_min = job_min.map(|v| v * factor);
                job_max = job_max.map(|v| v * factor);
            }
            None => {
                // Open question (b): missing rate is a warning, and the
                // ranges cannot be compared; fall back to the baseline
                warn!(
                    user_currency,
                    job_currency, "no conversion rate; salary treated as unknown"
                );
                return 10.0;
            }
        }
    }

    score += score_salary_ranges(user_min, user_max, job_min, job_max);
    score.min(SALARY_MAX)
}

fn score_salary_ranges(
    user_min: Option<f64>,
    user_max: Option<f64>,
    job_min: Option<f64>,
    job_max: Option<f64>,
) -> f64 {
    let mut score = 0.0;

    // Full overlap
    if let (Some(umin), Some(umax), Some(jmin), Some(jmax)) = (user_min, user_max, job_min, job_max)
    {
        if umin <= jmax && umax >= jmin {
            score += range_overlap_ratio(umin, umax, jmin, jmax) * 6.0;
        }
    }

    // Minimum requirement, with 20% tolerance
    if let (Some(umin), Some(jmax)) = (user_min, job_max) {
        if jmax >= umin {
            score += 3.0;
        } else if jmax >= umin * 0.8 {
            score += 2.0;
        }
    }

    // Budget ceiling, with 20% tolerance
    if let (Some(umax), Some(jmin)) = (user_max, job_min) {
        if jmin <= umax {
            score += 2.0;
        } else if jmin <= umax * 1.2 {
            score += 1.0;
        }
    }

    // Single-sided: minimums within 20% of each other
    if let (Some(umin), Some(jmin)) = (user_min, job_min) {
        if user_max.is_none() || job_max.is_none() {
            let spread = (umin - jmin).abs() / umin.max(jmin);
            if spread <= 0.2 {
                score += 2.0;
            }
        }
    }

    score
}

fn range_overlap_ratio(user_min: f64, user_max: f64, job_min: f64, job_max: f64) -> f64 {
    let start = user_min.max(job_min);
    let end = user_max.min(job_max);
    if start >= end {
        return 0.0;
    }
    let smaller = (user_max - user_min).min(job_max - job_min);
    if smaller <= 0.0 {
        return 0.0;
    }
    ((end - start) / smaller).min(1.0)
}

// =============================================================================
// Experience (10)
// =============================================================================

fn score_experience(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    let mut best: f64 = 0.0;

    if let Some(user_level) = prefs.experience_level {
        best = best.max(score_level(user_level, &posting.ai_job_level));
    }
    if let Some(user_years) = prefs.years_of_experience {
        best = best.max(score_years(
            user_years,
            posting.ai_years_experience_min,
            posting.ai_years_experience_max,
        ));
    }
    best
}

fn score_level(user_level: ExperienceLevel, job_levels: &[String]) -> f64 {
    let mut best: f64 = 0.0;
    for raw in job_levels {
        let Some(job_level) = ExperienceLevel::parse_loose(raw) else {
            continue;
        };
        let gap = (user_level.rank() - job_level.rank()).abs();
        let score = if gap == 0 {
            10.0
        } else if gap == 1 {
            8.0
        } else if gap == 2 {
            5.0
        } else if user_level.rank() > job_level.rank() && gap <= 3 {
            // Overqualified is still workable
            3.0
        } else if user_level == ExperienceLevel::Entry {
            // Entry-level users get extra leniency upward
            match gap {
                3 => 4.0,
                _ => 0.0,
            }
        } else {
            0.0
        };
        best = best.max(score);
    }
    best
}

fn score_years(user_years: i32, job_min: Option<i32>, job_max: Option<i32>) -> f64 {
    match (job_min, job_max) {
        (Some(min), Some(max)) => {
            if (min..=max).contains(&user_years) {
                10.0
            } else if user_years > max {
                match user_years - max {
                    0..=2 => 8.0,
                    3..=5 => 6.0,
                    _ => 4.0,
                }
            } else if user_years == 0 && min <= 3 {
                // Graduated credit for fresh graduates on junior postings
                match min {
                    0 | 1 => 8.0,
                    2 => 6.0,
                    _ => 4.0,
                }
            } else if f64::from(user_years) >= f64::from(min) * 0.8 {
                5.0
            } else {
                0.0
            }
        }
        (Some(min), None) => {
            if user_years >= min {
                9.0
            } else if user_years == 0 && min <= 3 {
                match min {
                    0 | 1 => 8.0,
                    2 => 6.0,
                    _ => 4.0,
                }
            } else if f64::from(user_years) >= f64::from(min) * 0.8 {
                6.0
            } else {
                0.0
            }
        }
        (None, Some(max)) => {
            if user_years <= max {
                8.0
            } else {
                0.0
            }
        }
        (None, None) => 0.0,
    }
}

// =============================================================================
// Job function (7)
// =============================================================================

const FUNCTION_SYNONYMS: &[(&str, &[&str])] = &[
    ("sales", &["sales", "business development", "revenue"]),
    ("technology", &["engineering", "it", "software", "data & analytics", "data"]),
    ("marketing", &["marketing", "growth", "communications"]),
    ("finance", &["finance", "accounting"]),
    ("operations", &["operations", "logistics"]),
    ("human resources", &["hr", "human resources", "people"]),
    ("design", &["design", "product design", "creative"]),
    ("customer service", &["customer service", "support", "customer success"]),
];

fn score_function(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    let Some(function) = posting.ai_job_function.as_deref() else {
        return 0.0;
    };
    let function = function.to_lowercase();

    for category in &prefs.job_categories {
        let category = category.to_lowercase();
        if function == category || function.contains(&category) || category.contains(&function) {
            return FUNCTION_MAX;
        }
        let synonyms = FUNCTION_SYNONYMS
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, syns)| *syns)
            .unwrap_or(&[]);
        if synonyms.iter().any(|s| function.contains(s)) {
            return 4.0;
        }
    }
    0.0
}

// =============================================================================
// Industry (5)
// =============================================================================

/// Industries where sales-family roles are routinely hired.
const SALES_FRIENDLY_INDUSTRIES: &[&str] = &[
    "retail",
    "fmcg",
    "real estate",
    "insurance",
    "banking",
    "financial services",
    "telecommunications",
    "e-commerce",
    "technology",
];

fn score_industry(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    if posting.ai_industry.is_empty() {
        return 0.0;
    }
    let job_industries: Vec<String> = posting
        .ai_industry
        .iter()
        .map(|i| i.to_lowercase())
        .collect();

    for industry in &prefs.industries {
        let industry = industry.to_lowercase();
        if job_industries
            .iter()
            .any(|ji| ji.contains(&industry) || industry.contains(ji.as_str()))
        {
            return INDUSTRY_MAX;
        }
    }

    // Sales-family roles are credited across sales-friendly industries
    let user_is_sales = prefs
        .job_roles
        .iter()
        .chain(prefs.job_categories.iter())
        .any(|r| r.to_lowercase().contains("sales"));
    if user_is_sales
        && job_industries
            .iter()
            .any(|ji| SALES_FRIENDLY_INDUSTRIES.iter().any(|s| ji.contains(s)))
    {
        return 3.0;
    }
    0.0
}

// =============================================================================
// Skills (20)
// =============================================================================

const SKILL_SYNONYMS: &[(&str, &[&str])] = &[
    ("javascript", &["js", "ecmascript", "node", "nodejs"]),
    ("python", &["py"]),
    ("postgresql", &["postgres", "psql"]),
    ("microsoft excel", &["excel", "spreadsheets"]),
    ("customer relationship management", &["crm", "salesforce", "hubspot"]),
    ("search engine optimization", &["seo"]),
    ("user experience", &["ux"]),
    ("user interface", &["ui"]),
];

fn skills_equivalent(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b || a.contains(&b) || b.contains(&a) {
        return true;
    }
    SKILL_SYNONYMS.iter().any(|(canonical, syns)| {
        let in_group = |s: &str| *canonical == s || syns.contains(&s);
        in_group(&a) && in_group(&b)
    })
}

fn score_skills(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    if prefs.required_skills.is_empty() {
        return 0.0;
    }

    let matched_required = prefs
        .required_skills
        .iter()
        .filter(|skill| {
            posting
                .ai_required_skills
                .iter()
                .any(|js| skills_equivalent(skill, js))
        })
        .count();
    let matched_preferred = prefs
        .required_skills
        .iter()
        .filter(|skill| {
            posting
                .ai_preferred_skills
                .iter()
                .any(|js| skills_equivalent(skill, js))
        })
        .count();

    let description = posting
        .description
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let matched_description = prefs
        .required_skills
        .iter()
        .filter(|skill| {
            let skill = skill.to_lowercase();
            skill.len() > 2 && description.contains(&skill)
        })
        .count();

    let total = prefs.required_skills.len() as f64;
    let score = (matched_required as f64 / total) * 12.0
        + (matched_preferred as f64 / total) * 6.0
        + (matched_description as f64 / total) * 4.0;
    score.min(SKILLS_MAX)
}

// =============================================================================
// Semantic cluster (5)
// =============================================================================

const CLUSTERS: &[&[&str]] = &[
    &["sales", "business development", "account", "revenue", "client"],
    &["developer", "engineer", "software", "programmer", "technical"],
    &["marketing", "brand", "content", "social media", "digital"],
    &["finance", "accounting", "audit", "banking", "investment"],
    &["nurse", "doctor", "medical", "clinical", "health"],
    &["teacher", "tutor", "instructor", "education", "training"],
    &["driver", "logistics", "dispatch", "delivery", "fleet"],
    &["customer service", "support", "call center", "helpdesk"],
];

fn cluster_of(text: &str) -> Option<usize> {
    let lower = text.to_lowercase();
    CLUSTERS
        .iter()
        .position(|terms| terms.iter().any(|t| lower.contains(t)))
}

fn score_cluster(prefs: &UserPreferences, posting: &CanonicalPosting) -> f64 {
    let user_cluster = prefs
        .job_roles
        .iter()
        .chain(prefs.job_categories.iter())
        .find_map(|r| cluster_of(r));
    let Some(user_cluster) = user_cluster else {
        return 0.0;
    };

    let job_text = format!(
        "{} {}",
        posting.title,
        posting.ai_job_titles.join(" ")
    );
    match cluster_of(&job_text) {
        Some(job_cluster) if job_cluster == user_cluster => CLUSTER_MAX,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::EmploymentType;
    use crate::domains::postings::testing::posting_fixture;
    use crate::domains::users::testing::preferences_fixture;

    #[test]
    fn happy_path_scores_high() {
        // Seed scenario: entry-level sales seeker in Lagos vs a hybrid
        // entry-level Lagos sales posting paying above their minimum
        let prefs = preferences_fixture();
        let posting = posting_fixture();

        let result = score_posting(&prefs, &posting).expect("location filter should pass");
        assert!(
            result.score >= 80.0,
            "expected >= 80, got {}",
            result.score
        );
        assert!(!result.reasons.is_empty());
    }

    #[test]
    fn location_filter_excludes_before_scoring() {
        let prefs = preferences_fixture();
        let mut posting = posting_fixture();
        posting.ai_city = Some("Kano".into());
        posting.ai_state = Some("Kano".into());
        posting.location = Some("Kano, Nigeria".into());
        posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
        posting.ai_remote_allowed = Some(false);

        assert!(score_posting(&prefs, &posting).is_none());
    }

    #[test]
    fn remote_posting_scores_despite_location() {
        let prefs = preferences_fixture();
        let mut posting = posting_fixture();
        posting.ai_city = Some("Kano".into());
        posting.ai_state = Some("Kano".into());
        posting.ai_work_arrangement = Some(WorkArrangement::Remote);
        posting.ai_remote_allowed = Some(true);

        assert!(score_posting(&prefs, &posting).is_some());
    }

    #[test]
    fn total_is_clipped_at_one_hundred() {
        let mut prefs = preferences_fixture();
        prefs.required_skills = vec!["negotiation".into(), "crm".into()];
        prefs.salary_max = Some(350_000);
        let posting = posting_fixture();

        let result = score_posting(&prefs, &posting).unwrap();
        assert!(result.score <= 100.0);
    }

    #[test]
    fn exact_title_match_scores_full() {
        let prefs = preferences_fixture();
        let posting = posting_fixture();
        assert_eq!(score_titles(&prefs, &posting), TITLE_MAX);
    }

    #[test]
    fn sales_family_cooccurrence_scores_high() {
        let mut prefs = preferences_fixture();
        prefs.job_roles = vec!["sales manager".into()];
        let mut posting = posting_fixture();
        posting.ai_job_titles = vec!["Sales Supervisor".into()];

        let score = score_titles(&prefs, &posting);
        assert!(score >= 32.0, "got {}", score);
    }

    #[test]
    fn hybrid_user_accepts_any_classified_arrangement() {
        let prefs = preferences_fixture(); // hybrid
        let mut posting = posting_fixture();

        posting.ai_work_arrangement = Some(WorkArrangement::Hybrid);
        assert_eq!(score_arrangement(&prefs, &posting), 20.0);

        posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
        posting.ai_remote_allowed = Some(false);
        assert_eq!(score_arrangement(&prefs, &posting), 18.0);
    }

    #[test]
    fn remote_user_rejects_onsite() {
        let mut prefs = preferences_fixture();
        prefs.work_arrangements = vec![WorkArrangement::Remote];
        let mut posting = posting_fixture();
        posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
        posting.ai_remote_allowed = Some(false);

        assert_eq!(score_arrangement(&prefs, &posting), 0.0);
    }

    #[test]
    fn missing_job_salary_gets_fair_baseline() {
        let prefs = preferences_fixture();
        let mut posting = posting_fixture();
        posting.salary_min = None;
        posting.salary_max = None;
        posting.salary_currency = None;
        posting.ai_salary_min = None;
        posting.ai_salary_max = None;
        posting.ai_salary_currency = None;

        assert_eq!(score_salary(&prefs, &posting), 10.0);
    }

    #[test]
    fn unconvertible_currency_falls_back_to_baseline() {
        let mut prefs = preferences_fixture();
        prefs.salary_currency = Some("NGN".into());
        let mut posting = posting_fixture();
        posting.ai_salary_currency = Some("CAD".into());
        posting.ai_salary_min = Some(4_000);
        posting.ai_salary_max = Some(5_000);

        assert_eq!(score_salary(&prefs, &posting), 10.0);
    }

    #[test]
    fn cross_currency_ranges_are_converted() {
        let mut prefs = preferences_fixture();
        prefs.salary_min = Some(700_000);
        prefs.salary_max = Some(1_200_000);
        prefs.salary_currency = Some("NGN".into());
        let mut posting = posting_fixture();
        // 1000-1500 USD/month = 750k-1.125M NGN: overlaps the user's range
        posting.ai_salary_currency = Some("USD".into());
        posting.ai_salary_min = Some(1_000);
        posting.ai_salary_max = Some(1_500);

        let score = score_salary(&prefs, &posting);
        assert!(score > 5.0, "got {}", score);
    }

    #[test]
    fn zero_years_graduated_credit() {
        // Spec boundary: user=0 vs job minimum 1/2/3 → 8/6/4
        assert_eq!(score_years(0, Some(1), Some(3)), 8.0);
        assert_eq!(score_years(0, Some(2), Some(4)), 6.0);
        assert_eq!(score_years(0, Some(3), Some(5)), 4.0);
        // In-range is a full score
        assert_eq!(score_years(0, Some(0), Some(2)), 10.0);
    }

    #[test]
    fn overqualified_years_degrade_gently() {
        assert_eq!(score_years(4, Some(0), Some(2)), 8.0);
        assert_eq!(score_years(7, Some(0), Some(2)), 6.0);
        assert_eq!(score_years(12, Some(0), Some(2)), 4.0);
    }

    #[test]
    fn level_adjacency() {
        assert_eq!(score_level(ExperienceLevel::Entry, &["entry".into()]), 10.0);
        assert_eq!(score_level(ExperienceLevel::Entry, &["junior".into()]), 8.0);
        assert_eq!(score_level(ExperienceLevel::Entry, &["mid".into()]), 5.0);
        assert_eq!(score_level(ExperienceLevel::Entry, &["senior".into()]), 4.0);
    }

    #[test]
    fn function_and_industry_synonyms() {
        let prefs = preferences_fixture();
        let posting = posting_fixture();
        assert_eq!(score_function(&prefs, &posting), FUNCTION_MAX);
        assert_eq!(score_industry(&prefs, &posting), INDUSTRY_MAX);
    }

    #[test]
    fn sales_roles_credited_in_sales_friendly_industries() {
        let mut prefs = preferences_fixture();
        prefs.industries = vec!["Agriculture".into()];
        let mut posting = posting_fixture();
        posting.ai_industry = vec!["Banking".into()];

        assert_eq!(score_industry(&prefs, &posting), 3.0);
    }

    #[test]
    fn skills_required_weigh_more_than_preferred() {
        let mut prefs = preferences_fixture();
        prefs.required_skills = vec!["negotiation".into()];
        let mut posting = posting_fixture();

        posting.ai_required_skills = vec!["negotiation".into()];
        posting.ai_preferred_skills = vec![];
        posting.description = None;
        let required_score = score_skills(&prefs, &posting);

        posting.ai_required_skills = vec![];
        posting.ai_preferred_skills = vec!["negotiation".into()];
        let preferred_score = score_skills(&prefs, &posting);

        assert!(required_score > preferred_score);
    }

    #[test]
    fn skill_synonyms_collapse() {
        assert!(skills_equivalent("CRM", "customer relationship management"));
        assert!(skills_equivalent("js", "javascript"));
        assert!(!skills_equivalent("python", "javascript"));
    }

    #[test]
    fn cluster_fallback() {
        let mut prefs = preferences_fixture();
        prefs.job_roles = vec!["client acquisition".into()];
        let posting = posting_fixture();
        assert_eq!(score_cluster(&prefs, &posting), CLUSTER_MAX);
    }

    #[test]
    fn reasons_cover_strong_factors_only() {
        let prefs = preferences_fixture();
        let posting = posting_fixture();
        let result = score_posting(&prefs, &posting).unwrap();

        // Title factor is at max, so a role reason must be present
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("sales executive")));
    }

    #[test]
    fn round_trip_scoring_is_deterministic() {
        let prefs = preferences_fixture();
        let posting = posting_fixture();
        let a = score_posting(&prefs, &posting).unwrap();
        let b = score_posting(&prefs, &posting).unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.reasons, b.reasons);
    }

    #[test]
    fn employment_type_fixture_is_well_formed() {
        let prefs = preferences_fixture();
        assert_eq!(prefs.employment_types, vec![EmploymentType::FullTime]);
    }
}
