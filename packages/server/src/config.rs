use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub whatsapp_access_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_verify_token: String,
    pub whatsapp_app_secret: String,
    pub metrics_token: Option<String>,
    pub enrichment_model: String,
    pub embedding_model: String,
    pub min_match_score: f64,
    pub similarity_threshold: f64,
    pub daily_alert_cap: i64,
    pub window_hours: i64,
    pub enrichment_batch_size: i64,
    pub enrichment_interval_hours: u32,
    pub reminder_interval_minutes: u64,
    pub backfill_interval_minutes: u32,
    pub max_alerts_per_batch: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::validate_env_vars();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            whatsapp_access_token: env::var("WHATSAPP_ACCESS_TOKEN")
                .context("WHATSAPP_ACCESS_TOKEN must be set")?,
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("WHATSAPP_PHONE_NUMBER_ID must be set")?,
            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN")
                .context("WHATSAPP_VERIFY_TOKEN must be set")?,
            whatsapp_app_secret: env::var("WHATSAPP_APP_SECRET")
                .context("WHATSAPP_APP_SECRET must be set")?,
            metrics_token: env::var("METRICS_TOKEN").ok(),
            enrichment_model: env::var("ENRICHMENT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            min_match_score: parse_env("MIN_MATCH_SCORE", 39.0)?,
            similarity_threshold: parse_env("SIMILARITY_THRESHOLD", 0.65)?,
            daily_alert_cap: parse_env("DAILY_ALERT_CAP", 10)?,
            window_hours: parse_env("WINDOW_HOURS", 24)?,
            enrichment_batch_size: parse_env("ENRICHMENT_BATCH_SIZE", 50)?,
            enrichment_interval_hours: parse_env("ENRICHMENT_INTERVAL_HOURS", 2)?,
            reminder_interval_minutes: parse_env("REMINDER_INTERVAL_MINUTES", 5)?,
            backfill_interval_minutes: parse_env("BACKFILL_INTERVAL_MINUTES", 20)?,
            max_alerts_per_batch: parse_env("MAX_ALERTS_PER_BATCH", 50)?,
        })
    }

    /// Validate environment variables and log what is missing or defaulted
    fn validate_env_vars() {
        let required_vars = [
            "DATABASE_URL",
            "OPENAI_API_KEY",
            "WHATSAPP_ACCESS_TOKEN",
            "WHATSAPP_PHONE_NUMBER_ID",
            "WHATSAPP_VERIFY_TOKEN",
            "WHATSAPP_APP_SECRET",
        ];

        let optional_vars = [
            ("PORT", "8080"),
            ("METRICS_TOKEN", "disabled"),
            ("ENRICHMENT_MODEL", "gpt-4o-mini"),
            ("EMBEDDING_MODEL", "text-embedding-3-small"),
            ("MIN_MATCH_SCORE", "39"),
            ("SIMILARITY_THRESHOLD", "0.65"),
            ("DAILY_ALERT_CAP", "10"),
            ("WINDOW_HOURS", "24"),
            ("ENRICHMENT_BATCH_SIZE", "50"),
            ("ENRICHMENT_INTERVAL_HOURS", "2"),
            ("REMINDER_INTERVAL_MINUTES", "5"),
            ("BACKFILL_INTERVAL_MINUTES", "20"),
            ("MAX_ALERTS_PER_BATCH", "50"),
        ];

        let missing_required: Vec<_> = required_vars
            .iter()
            .filter(|var| env::var(var).is_err())
            .collect();

        let missing_optional: Vec<_> = optional_vars
            .iter()
            .filter(|(var, _)| env::var(var).is_err())
            .collect();

        if !missing_optional.is_empty() {
            tracing::warn!("Optional environment variables not set (using defaults):");
            for (var, default) in missing_optional {
                tracing::warn!("  {} (default: {})", var, default);
            }
        }

        if !missing_required.is_empty() {
            tracing::error!("Required environment variables are missing:");
            for var in &missing_required {
                tracing::error!("  {}", var);
            }
            tracing::error!("Server will fail to start without these variables!");
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(var) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} must be a valid number", var)),
        Err(_) => Ok(default),
    }
}
