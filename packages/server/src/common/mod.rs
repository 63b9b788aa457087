//! Shared utilities with no domain knowledge.

pub mod content_hash;
pub mod types;

pub use content_hash::content_digest;
pub use types::{EmploymentType, ExperienceLevel, WorkArrangement};
