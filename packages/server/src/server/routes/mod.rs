pub mod health;
pub mod metrics;
pub mod webhook;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use webhook::{webhook_get_handler, webhook_post_handler};
