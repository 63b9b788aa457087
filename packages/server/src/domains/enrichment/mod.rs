pub mod prompt;
pub mod schema;
pub mod worker;

pub use schema::JobEnrichment;
pub use worker::{EnrichmentStats, EnrichmentWorker};
