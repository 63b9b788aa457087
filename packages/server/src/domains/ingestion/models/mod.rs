pub mod raw_posting;

pub use raw_posting::{EnqueueOutcome, RawPosting};
