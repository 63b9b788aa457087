//! Application setup and router construction.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::deps::ServerDeps;
use crate::server::routes::{
    health_handler, metrics_handler, webhook_get_handler, webhook_post_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub verify_token: String,
    pub app_secret: String,
    pub metrics_token: Option<String>,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>, config: &Config) -> Self {
        Self {
            deps,
            verify_token: config.whatsapp_verify_token.clone(),
            app_secret: config.whatsapp_app_secret.clone(),
            metrics_token: config.metrics_token.clone(),
        }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/webhook",
            get(webhook_get_handler).post(webhook_post_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
