//! End-to-end matching scenarios over the pure matcher stack.

use server_core::common::types::WorkArrangement;
use server_core::domains::matching::engine::{MatchEngine, MatchMethod};
use server_core::domains::matching::location::is_location_compatible;
use server_core::domains::matching::rules::score_posting;
use server_core::domains::postings::testing::posting_fixture;
use server_core::domains::users::testing::preferences_fixture;

fn engine() -> MatchEngine {
    MatchEngine::new(0.65, 39.0)
}

/// Real-time happy path: an entry-level Lagos sales seeker against a
/// matching hybrid Lagos posting scores at least 80.
#[test]
fn lagos_sales_seeker_matches_lagos_sales_posting() {
    let prefs = preferences_fixture();
    let posting = posting_fixture();

    let outcome = engine()
        .match_user_to_posting(&prefs, &posting)
        .expect("should match");
    assert_eq!(outcome.method, MatchMethod::Rules);
    assert!(outcome.score >= 80.0, "score was {}", outcome.score);
}

/// A Lagos-only on-site user never sees a Kano on-site posting.
#[test]
fn kano_onsite_posting_is_filtered_for_lagos_user() {
    let mut prefs = preferences_fixture();
    prefs.work_arrangements = vec![WorkArrangement::OnSite];

    let mut posting = posting_fixture();
    posting.location = Some("Kano, Nigeria".into());
    posting.ai_city = Some("Kano".into());
    posting.ai_state = Some("Kano".into());
    posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
    posting.ai_remote_allowed = Some(false);

    assert!(!is_location_compatible(&prefs, &posting));
    assert!(engine().match_user_to_posting(&prefs, &posting).is_none());
}

/// The same posting made remote bypasses the location filter and can match.
#[test]
fn remote_kano_posting_reaches_lagos_user() {
    let prefs = preferences_fixture();

    let mut posting = posting_fixture();
    posting.location = Some("Kano, Nigeria".into());
    posting.ai_city = Some("Kano".into());
    posting.ai_state = Some("Kano".into());
    posting.ai_work_arrangement = Some(WorkArrangement::Remote);
    posting.ai_remote_allowed = Some(true);

    assert!(is_location_compatible(&prefs, &posting));
    let outcome = engine().match_user_to_posting(&prefs, &posting);
    assert!(outcome.is_some());
}

/// Location-filter monotonicity: removing every location preference can
/// only grow the set of postings that pass.
#[test]
fn dropping_location_preferences_grows_pass_set() {
    let cities = [
        ("Lagos", "Lagos"),
        ("Kano", "Kano"),
        ("Abuja", "FCT"),
        ("Port Harcourt", "Rivers"),
    ];

    let with_pref = preferences_fixture();
    let mut without_pref = preferences_fixture();
    without_pref.preferred_locations.clear();

    for (city, state) in cities {
        let mut posting = posting_fixture();
        posting.ai_city = Some(city.into());
        posting.ai_state = Some(state.into());
        posting.location = Some(format!("{}, Nigeria", city));
        posting.ai_work_arrangement = Some(WorkArrangement::OnSite);
        posting.ai_remote_allowed = Some(false);

        if is_location_compatible(&with_pref, &posting) {
            assert!(is_location_compatible(&without_pref, &posting));
        }
    }
}

/// Scores repeat exactly for identical inputs (round-trip law).
#[test]
fn scoring_is_a_pure_function() {
    let prefs = preferences_fixture();
    let posting = posting_fixture();

    let first = score_posting(&prefs, &posting).unwrap();
    for _ in 0..10 {
        let again = score_posting(&prefs, &posting).unwrap();
        assert_eq!(first.score, again.score);
        assert_eq!(first.reasons, again.reasons);
    }
}

/// Reason strings accompany every dispatch-worthy match.
#[test]
fn matches_carry_reasons() {
    let prefs = preferences_fixture();
    let posting = posting_fixture();

    let outcome = engine().match_user_to_posting(&prefs, &posting).unwrap();
    assert!(!outcome.reasons.is_empty());
}
