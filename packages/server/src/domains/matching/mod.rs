pub mod currency;
pub mod engine;
pub mod location;
pub mod rules;

pub use engine::{cosine_similarity, MatchEngine, MatchMethod, MatchOutcome};
pub use rules::RuleMatch;
