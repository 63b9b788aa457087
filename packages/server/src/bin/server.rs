// Main entry point for the job-discovery server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use openai_client::OpenAiClient;
use server_core::domains::embeddings::{CachingEmbeddingService, OpenAiEmbeddingBackend};
use server_core::domains::windows::ReminderDaemon;
use server_core::kernel::{
    scheduled_tasks, OpenAiChatModel, RuntimeSettings, ServerDeps, ServiceHost, SystemClock,
    ThrottledChatModel, ThrottledEmbeddingService, ThrottledMessenger, WhatsAppMessenger,
};
use server_core::server::{build_app, AppState};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whatsapp_client::{WhatsAppClient, WhatsAppOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting job discovery server");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External clients behind the kernel traits, throttled to provider
    // limits and per-minute budgets
    const CHAT_SENDS_PER_SECOND: u32 = 20;
    const MODEL_CALLS_PER_MINUTE: u32 = 120;
    const EMBEDDING_CALLS_PER_MINUTE: u32 = 300;

    let chat_model = Arc::new(ThrottledChatModel::new(
        Arc::new(OpenAiChatModel::new(
            OpenAiClient::with_timeout(config.openai_api_key.clone(), Duration::from_secs(30)),
            config.enrichment_model.clone(),
        )),
        MODEL_CALLS_PER_MINUTE,
    ));
    let embeddings = Arc::new(CachingEmbeddingService::new(Arc::new(
        ThrottledEmbeddingService::new(
            Arc::new(OpenAiEmbeddingBackend::new(
                OpenAiClient::with_timeout(config.openai_api_key.clone(), Duration::from_secs(10)),
                config.embedding_model.clone(),
            )),
            EMBEDDING_CALLS_PER_MINUTE,
        ),
    )));
    let messenger = Arc::new(ThrottledMessenger::new(
        Arc::new(WhatsAppMessenger::new(Arc::new(WhatsAppClient::new(
            WhatsAppOptions {
                access_token: config.whatsapp_access_token.clone(),
                phone_number_id: config.whatsapp_phone_number_id.clone(),
            },
        )))),
        CHAT_SENDS_PER_SECOND,
    ));

    let deps = ServerDeps::new(
        pool.clone(),
        chat_model,
        embeddings,
        messenger,
        Arc::new(SystemClock),
        RuntimeSettings::from_config(&config),
    );

    // Fine-cadence reminder daemon
    let mut host = ServiceHost::new();
    host.spawn(ReminderDaemon::new(
        deps.clone(),
        Duration::from_secs(config.reminder_interval_minutes * 60),
    ));

    // Coarse-cadence scheduled tasks
    let scheduler = scheduled_tasks::start_scheduler(deps.clone(), &config, host.shutdown_token())
        .await
        .context("Failed to start scheduler")?;

    // HTTP surface: webhook, health, metrics
    let state = AppState::new(Arc::new(deps), &config);
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down");
    host.shutdown().await;
    let mut scheduler = scheduler;
    scheduler.shutdown().await.ok();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
