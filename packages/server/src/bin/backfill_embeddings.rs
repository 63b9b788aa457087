// One-shot embedding back-fill for users and postings missing vectors.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use openai_client::OpenAiClient;
use server_core::domains::embeddings::backfill::run_backfill;
use server_core::domains::embeddings::{CachingEmbeddingService, OpenAiEmbeddingBackend};
use server_core::kernel::{OpenAiChatModel, RuntimeSettings, ServerDeps, SystemClock, WhatsAppMessenger};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use whatsapp_client::{WhatsAppClient, WhatsAppOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let deps = ServerDeps::new(
        pool,
        Arc::new(OpenAiChatModel::new(
            OpenAiClient::with_timeout(config.openai_api_key.clone(), Duration::from_secs(30)),
            config.enrichment_model.clone(),
        )),
        Arc::new(CachingEmbeddingService::new(Arc::new(
            OpenAiEmbeddingBackend::new(
                OpenAiClient::with_timeout(config.openai_api_key.clone(), Duration::from_secs(10)),
                config.embedding_model.clone(),
            ),
        ))),
        Arc::new(WhatsAppMessenger::new(Arc::new(WhatsAppClient::new(
            WhatsAppOptions {
                access_token: config.whatsapp_access_token.clone(),
                phone_number_id: config.whatsapp_phone_number_id.clone(),
            },
        )))),
        Arc::new(SystemClock),
        RuntimeSettings::from_config(&config),
    );

    let stats = run_backfill(&deps).await?;
    tracing::info!(
        users = stats.users_embedded,
        postings = stats.postings_embedded,
        errors = stats.errors,
        "back-fill finished"
    );
    Ok(())
}
