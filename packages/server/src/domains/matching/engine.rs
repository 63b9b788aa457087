//! Match engine: embedding matcher first, rule matcher as the fallback.
//!
//! The embedding path is authoritative whenever both sides carry vectors of
//! a compatible version; the rule matcher only runs when one side lacks one.

use crate::domains::matching::rules::{score_posting, RuleMatch};
use crate::domains::postings::models::CanonicalPosting;
use crate::domains::users::models::UserPreferences;

/// Which matcher produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Embedding,
    Rules,
}

/// A dispatch-ready match decision.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub score: f64,
    pub reasons: Vec<String>,
    pub method: MatchMethod,
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    /// Cosine similarity floor for the embedding matcher, inclusive.
    pub similarity_threshold: f64,
    /// Rule-matcher score floor, inclusive.
    pub min_match_score: f64,
}

impl MatchEngine {
    pub fn new(similarity_threshold: f64, min_match_score: f64) -> Self {
        Self {
            similarity_threshold,
            min_match_score,
        }
    }

    /// Decide whether this posting should be dispatched to this user.
    ///
    /// Returns `None` when the posting does not clear the applicable
    /// threshold (or fails the location filter on the rule path).
    pub fn match_user_to_posting(
        &self,
        prefs: &UserPreferences,
        posting: &CanonicalPosting,
    ) -> Option<MatchOutcome> {
        if let (Some(user_vec), Some(job_vec)) = (&prefs.embedding, &posting.embedding) {
            if prefs.embedding_version == posting.embedding_version {
                let similarity = cosine_similarity(user_vec.as_slice(), job_vec.as_slice());
                if similarity >= self.similarity_threshold {
                    let percent = (similarity * 100.0).min(100.0);
                    return Some(MatchOutcome {
                        score: percent,
                        reasons: vec![format!("semantic similarity: {:.0}%", percent)],
                        method: MatchMethod::Embedding,
                    });
                }
                return None;
            }
            // Incompatible embedding versions cannot be compared; fall
            // through to the rule matcher
        }

        let RuleMatch { score, reasons } = score_posting(prefs, posting)?;
        if score >= self.min_match_score {
            Some(MatchOutcome {
                score,
                reasons,
                method: MatchMethod::Rules,
            })
        } else {
            None
        }
    }
}

/// Cosine similarity of two vectors. Zero for mismatched or zero-norm input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::testing::posting_fixture;
    use crate::domains::users::testing::preferences_fixture;
    use pgvector::Vector;

    fn engine() -> MatchEngine {
        MatchEngine::new(0.65, 39.0)
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.5f32, 0.5, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_handles_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn embedding_path_is_authoritative_when_vectors_present() {
        let mut prefs = preferences_fixture();
        let mut posting = posting_fixture();
        prefs.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        prefs.embedding_version = Some(1);
        posting.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        posting.embedding_version = Some(1);

        let outcome = engine().match_user_to_posting(&prefs, &posting).unwrap();
        assert_eq!(outcome.method, MatchMethod::Embedding);
        assert_eq!(outcome.score, 100.0);
        assert_eq!(outcome.reasons, vec!["semantic similarity: 100%"]);
    }

    #[test]
    fn similarity_exactly_at_threshold_is_included() {
        let mut prefs = preferences_fixture();
        let mut posting = posting_fixture();
        // cos = 0.65 exactly
        let angle = 0.65f64.acos();
        prefs.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        prefs.embedding_version = Some(1);
        posting.embedding = Some(Vector::from(vec![angle.cos() as f32, angle.sin() as f32]));
        posting.embedding_version = Some(1);

        let outcome = engine().match_user_to_posting(&prefs, &posting);
        assert!(outcome.is_some());
    }

    #[test]
    fn similarity_below_threshold_is_excluded_without_fallback() {
        let mut prefs = preferences_fixture();
        let mut posting = posting_fixture();
        prefs.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        prefs.embedding_version = Some(1);
        posting.embedding = Some(Vector::from(vec![0.0f32, 1.0]));
        posting.embedding_version = Some(1);

        // The rule matcher would accept this pairing, but the embedding
        // decision is final when both vectors are present
        assert!(engine().match_user_to_posting(&prefs, &posting).is_none());
    }

    #[test]
    fn missing_embedding_falls_back_to_rules() {
        let prefs = preferences_fixture();
        let posting = posting_fixture();

        let outcome = engine().match_user_to_posting(&prefs, &posting).unwrap();
        assert_eq!(outcome.method, MatchMethod::Rules);
        assert!(outcome.score >= 39.0);
    }

    #[test]
    fn incompatible_embedding_versions_fall_back_to_rules() {
        let mut prefs = preferences_fixture();
        let mut posting = posting_fixture();
        prefs.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        prefs.embedding_version = Some(1);
        posting.embedding = Some(Vector::from(vec![1.0f32, 0.0]));
        posting.embedding_version = Some(2);

        let outcome = engine().match_user_to_posting(&prefs, &posting).unwrap();
        assert_eq!(outcome.method, MatchMethod::Rules);
    }

    #[test]
    fn rule_score_below_threshold_is_rejected() {
        let mut prefs = preferences_fixture();
        prefs.job_roles = vec!["neurosurgeon".into()];
        prefs.job_categories = vec!["healthcare".into()];
        prefs.required_skills = vec!["surgery".into()];
        prefs.industries = vec!["Hospitals".into()];
        prefs.work_arrangements = vec![];
        prefs.salary_min = None;
        prefs.salary_currency = None;
        prefs.experience_level = None;
        prefs.years_of_experience = None;
        let posting = posting_fixture();

        assert!(engine().match_user_to_posting(&prefs, &posting).is_none());
    }
}
