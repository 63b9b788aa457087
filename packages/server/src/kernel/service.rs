//! Long-running worker services with cooperative cancellation.
//!
//! A `Service` is a loop that checks its `CancellationToken` at every
//! iteration boundary. The `ServiceHost` owns the token, spawns all
//! services, and on shutdown cancels them and waits out a grace window.

use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A long-running background service.
#[async_trait::async_trait]
pub trait Service: Send + 'static {
    fn name(&self) -> &'static str;

    /// Run until the token is cancelled. Implementations must return within
    /// the host's grace window after cancellation.
    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

/// Runs a set of services and coordinates their shutdown.
pub struct ServiceHost {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<Result<()>>)>,
    grace: Duration,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
            grace: Duration::from_secs(15),
        }
    }

    /// Override the shutdown grace window.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Token handed to services; callers may derive child tokens from it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn a service onto the runtime.
    pub fn spawn<S: Service>(&mut self, service: S) {
        let name = service.name();
        let token = self.shutdown.clone();
        info!(service = name, "starting service");
        let handle = tokio::spawn(async move { Box::new(service).run(token).await });
        self.handles.push((name, handle));
    }

    /// Cancel all services and wait for them to drain.
    pub async fn shutdown(self) {
        info!("shutting down services");
        self.shutdown.cancel();

        for (name, handle) in self.handles {
            match tokio::time::timeout(self.grace, handle).await {
                Ok(Ok(Ok(()))) => info!(service = name, "service stopped"),
                Ok(Ok(Err(e))) => error!(service = name, error = %e, "service failed"),
                Ok(Err(e)) => error!(service = name, error = %e, "service panicked"),
                Err(_) => warn!(service = name, "service did not stop within grace window"),
            }
        }
    }
}

impl Default for ServiceHost {
    fn default() -> Self {
        Self::new()
    }
}
