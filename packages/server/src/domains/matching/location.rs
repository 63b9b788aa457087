//! Location compatibility, the hard filter applied before any scoring.
//!
//! A posting that fails the filter is excluded entirely. Matching tiers,
//! strongest first: direct substring, curated Nigerian abbreviation table,
//! curated country-synonym table, and same-region city clusters as the
//! weakest, last-resort tier.

use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::UserPreferences;

/// Nigerian city/state variations keyed by the canonical spelling.
const NIGERIAN_LOCATIONS: &[(&str, &[&str])] = &[
    (
        "lagos",
        &[
            "lagos",
            "los",
            "lagos state",
            "lagos island",
            "lagos mainland",
            "ikeja",
            "victoria island",
            "vi",
            "ikoyi",
            "lekki",
            "surulere",
            "yaba",
        ],
    ),
    ("los", &["lagos", "los", "lagos state"]),
    (
        "abuja",
        &[
            "abuja",
            "fct",
            "federal capital territory",
            "garki",
            "wuse",
            "maitama",
            "asokoro",
            "gwarinpa",
        ],
    ),
    ("fct", &["abuja", "fct", "federal capital territory"]),
    (
        "port harcourt",
        &["port harcourt", "ph", "portharcourt", "rivers", "rivers state"],
    ),
    ("ph", &["port harcourt", "ph", "portharcourt", "rivers"]),
    ("kano", &["kano", "kano state"]),
    ("ibadan", &["ibadan", "oyo", "oyo state"]),
    ("kaduna", &["kaduna", "kaduna state"]),
    ("jos", &["jos", "plateau", "plateau state"]),
    ("enugu", &["enugu", "enugu state"]),
    ("calabar", &["calabar", "cross river", "cross river state"]),
    ("warri", &["warri", "delta", "delta state"]),
    ("benin", &["benin", "benin city", "edo", "edo state"]),
    ("aba", &["aba", "abia", "abia state"]),
    ("onitsha", &["onitsha", "anambra", "anambra state"]),
];

/// Country synonyms for non-city preferences.
const COUNTRY_SYNONYMS: &[(&str, &[&str])] = &[
    ("nigeria", &["nigeria", "ng", "nigerian", "naija"]),
    ("ghana", &["ghana", "gh", "ghanaian"]),
    ("kenya", &["kenya", "ke", "kenyan", "nairobi"]),
    (
        "south africa",
        &["south africa", "za", "sa", "cape town", "johannesburg"],
    ),
    (
        "united states",
        &["usa", "us", "united states", "america", "american"],
    ),
    (
        "united kingdom",
        &["uk", "united kingdom", "britain", "british", "england", "london"],
    ),
    ("canada", &["canada", "ca", "canadian", "toronto", "vancouver"]),
    ("germany", &["germany", "de", "german", "berlin", "munich"]),
    ("france", &["france", "fr", "french", "paris"]),
];

/// Regional clusters of Nigerian cities. Same-region is the weakest tier.
const REGIONAL_CLUSTERS: &[(&str, &[&str])] = &[
    (
        "southwest",
        &["lagos", "ibadan", "abeokuta", "ilorin", "oshogbo", "akure", "ado ekiti"],
    ),
    (
        "southeast",
        &["enugu", "onitsha", "aba", "owerri", "umuahia", "awka", "abakaliki"],
    ),
    (
        "southsouth",
        &["port harcourt", "warri", "benin", "calabar", "uyo", "yenagoa"],
    ),
    (
        "northcentral",
        &["abuja", "jos", "makurdi", "minna", "lokoja", "lafia"],
    ),
    (
        "northwest",
        &["kano", "kaduna", "zaria", "sokoto", "katsina"],
    ),
    (
        "northeast",
        &["maiduguri", "yola", "bauchi", "gombe", "jalingo"],
    ),
];

/// Decide whether the posting passes the location filter for this user.
pub fn is_location_compatible(prefs: &UserPreferences, posting: &CanonicalPosting) -> bool {
    // Remote postings bypass the filter entirely
    if posting.allows_remote() {
        return true;
    }

    // No location preferences: everything passes
    if prefs.preferred_locations.is_empty() {
        return true;
    }

    // Relocation: any posting with a resolvable location passes
    if prefs.willing_to_relocate {
        let has_location = posting
            .location
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
            || posting.ai_city.is_some()
            || posting.ai_country.is_some();
        if has_location {
            return true;
        }
    }

    let job_location = lower(&posting.location);
    let ai_city = lower(&posting.ai_city);
    let ai_state = lower(&posting.ai_state);
    let ai_country = lower(&posting.ai_country);

    prefs.preferred_locations.iter().any(|user_location| {
        locations_match(
            &user_location.to_lowercase(),
            &job_location,
            &ai_city,
            &ai_state,
            &ai_country,
        )
    })
}

fn lower(value: &Option<String>) -> String {
    value
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

fn locations_match(
    user_location: &str,
    job_location: &str,
    ai_city: &str,
    ai_state: &str,
    ai_country: &str,
) -> bool {
    let user_location = user_location.trim();
    if user_location.is_empty() {
        return false;
    }

    // Tier 1: direct case-insensitive substring
    if (!job_location.is_empty() && job_location.contains(user_location))
        || (!ai_city.is_empty() && ai_city.contains(user_location))
        || (!ai_state.is_empty() && ai_state.contains(user_location))
    {
        return true;
    }

    let all_job_text = format!("{} {} {}", job_location, ai_city, ai_state);
    for term in extract_location_terms(user_location) {
        if all_job_text.contains(&term) {
            return true;
        }
    }

    // Tier 2: Nigerian abbreviations and variations
    if nigerian_location_match(user_location, &all_job_text) {
        return true;
    }

    // Tier 3: country synonyms
    let country_text = format!("{} {} {}", job_location, ai_city, ai_country);
    if country_synonym_match(user_location, &country_text) {
        return true;
    }

    // Tier 4 (last resort): same Nigerian region
    same_region_match(user_location, ai_city, ai_state)
}

/// Break a user location into searchable terms: individual words longer
/// than two chars, adjacent word pairs, and the full string.
fn extract_location_terms(location: &str) -> Vec<String> {
    let cleaned = location.replace([',', '-'], " ");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();

    let mut terms: Vec<String> = parts
        .iter()
        .filter(|p| p.len() > 2)
        .map(|p| p.to_string())
        .collect();

    for pair in parts.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms.push(location.trim().to_string());
    terms.dedup();
    terms
}

fn nigerian_location_match(user_location: &str, all_job_text: &str) -> bool {
    let variations = NIGERIAN_LOCATIONS
        .iter()
        .find(|(_, vars)| vars.contains(&user_location))
        .map(|(_, vars)| *vars);

    match variations {
        Some(vars) => vars.iter().any(|v| all_job_text.contains(v)),
        None => false,
    }
}

fn country_synonym_match(user_location: &str, country_text: &str) -> bool {
    let variations = COUNTRY_SYNONYMS
        .iter()
        .find(|(_, vars)| vars.contains(&user_location))
        .map(|(_, vars)| *vars);

    match variations {
        Some(vars) => vars.iter().any(|v| country_text.contains(v)),
        None => false,
    }
}

fn region_of(location: &str) -> Option<&'static str> {
    REGIONAL_CLUSTERS
        .iter()
        .find(|(_, cities)| cities.iter().any(|city| location.contains(city)))
        .map(|(region, _)| *region)
}

fn same_region_match(user_location: &str, ai_city: &str, ai_state: &str) -> bool {
    let Some(user_region) = region_of(user_location) else {
        return false;
    };
    let job_text = format!("{} {}", ai_city, ai_state);
    match region_of(&job_text) {
        Some(job_region) => job_region == user_region,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::testing::posting_fixture;
    use crate::domains::users::testing::preferences_fixture;

    fn lagos_user() -> UserPreferences {
        let mut prefs = preferences_fixture();
        prefs.preferred_locations = vec!["Lagos".into()];
        prefs.willing_to_relocate = false;
        prefs.work_arrangements = vec![];
        prefs
    }

    fn onsite_posting_in(city: &str, state: &str) -> CanonicalPosting {
        let mut posting = posting_fixture();
        posting.ai_city = Some(city.into());
        posting.ai_state = Some(state.into());
        posting.location = Some(format!("{}, Nigeria", city));
        posting.ai_remote_allowed = Some(false);
        posting.ai_work_arrangement = Some(crate::common::types::WorkArrangement::OnSite);
        posting
    }

    #[test]
    fn no_preferences_passes_everything() {
        let mut prefs = lagos_user();
        prefs.preferred_locations.clear();
        let posting = onsite_posting_in("Kano", "Kano");
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn direct_city_match_passes() {
        let prefs = lagos_user();
        let posting = onsite_posting_in("Lagos", "Lagos");
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn mismatched_onsite_city_fails() {
        let prefs = lagos_user();
        let posting = onsite_posting_in("Kano", "Kano");
        assert!(!is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn remote_posting_bypasses_filter() {
        let prefs = lagos_user();
        let mut posting = onsite_posting_in("Kano", "Kano");
        posting.ai_remote_allowed = Some(true);
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn relocation_passes_any_located_posting() {
        let mut prefs = lagos_user();
        prefs.willing_to_relocate = true;
        let posting = onsite_posting_in("Kano", "Kano");
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn abbreviation_table_matches() {
        let mut prefs = lagos_user();
        prefs.preferred_locations = vec!["PH".into()];
        let posting = onsite_posting_in("Port Harcourt", "Rivers");
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn fct_matches_abuja() {
        let mut prefs = lagos_user();
        prefs.preferred_locations = vec!["FCT".into()];
        let posting = onsite_posting_in("Abuja", "FCT");
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn country_synonyms_match() {
        let mut prefs = lagos_user();
        prefs.preferred_locations = vec!["nigeria".into()];
        let mut posting = onsite_posting_in("Kano", "Kano");
        posting.ai_country = Some("Nigeria".into());
        assert!(is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn same_region_is_last_resort() {
        let mut prefs = lagos_user();
        prefs.preferred_locations = vec!["ibadan".into()];
        // Ibadan and Lagos are both southwest
        let posting = onsite_posting_in("Lagos", "Lagos");
        assert!(is_location_compatible(&prefs, &posting));

        // Kano is northwest: no region match
        let posting = onsite_posting_in("Kano", "Kano");
        assert!(!is_location_compatible(&prefs, &posting));
    }

    #[test]
    fn adding_a_preference_never_grows_the_pass_set() {
        // Monotonicity: a pass set under {Lagos} is a subset of the pass set
        // under no preferences
        let postings = [
            onsite_posting_in("Lagos", "Lagos"),
            onsite_posting_in("Kano", "Kano"),
            onsite_posting_in("Abuja", "FCT"),
        ];

        let mut no_prefs = lagos_user();
        no_prefs.preferred_locations.clear();
        let lagos_only = lagos_user();

        for posting in &postings {
            if is_location_compatible(&lagos_only, posting) {
                assert!(is_location_compatible(&no_prefs, posting));
            }
        }
    }
}
