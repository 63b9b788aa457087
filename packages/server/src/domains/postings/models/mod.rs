pub mod canonical_posting;

pub use canonical_posting::{top_skills, CanonicalPosting, SimilarPosting};
