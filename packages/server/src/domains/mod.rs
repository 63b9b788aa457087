//! Domain modules. Each owns its entities' write path exclusively:
//! enrichment owns canonical postings, delivery owns history rows, windows
//! owns conversation windows and the reminder ledger, users owns the user
//! embedding.

pub mod delivery;
pub mod embeddings;
pub mod enrichment;
pub mod inbound;
pub mod ingestion;
pub mod matching;
pub mod postings;
pub mod users;
pub mod windows;
