//! Server startup and binding
//!
//! Binds the configured host/port, serves the router and drains in-flight
//! requests on Ctrl-C, bounded by `shutdown_timeout_secs`.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes::{self, AppState};

/// Server instance that can be started
pub struct Server {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// The built router
    router: Router,
}

impl Server {
    /// Create a server, opening the database and mail transport the
    /// configuration names
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(Arc::new(config))?;
        Ok(Self::with_state(state))
    }

    /// Create a server over prepared state
    pub fn with_state(state: AppState) -> Self {
        let config = state.config.clone();
        let router = routes::build_router(state);
        Self { config, router }
    }

    /// Address string the server will bind to
    pub fn bind_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_addr()).await?;
        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        self.serve_until(listener, shutdown_signal(), timeout).await
    }

    /// Serve on `listener` until `signal` resolves, then drain for at most
    /// `drain_timeout`
    pub async fn serve_until<S>(
        self,
        listener: TcpListener,
        signal: S,
        drain_timeout: Duration,
    ) -> Result<(), ServerError>
    where
        S: std::future::Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        let stop = Arc::new(Notify::new());
        let stopped = stop.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { stopped.notified().await })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return result.map_err(ServerError::from),
            _ = signal => {
                tracing::info!("shutdown signal received, draining connections");
                stop.notify_one();
            }
        }

        match tokio::time::timeout(drain_timeout, serve).await {
            Ok(result) => {
                tracing::info!("server stopped");
                result.map_err(ServerError::from)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = drain_timeout.as_secs(),
                    "graceful shutdown timed out, dropping open connections"
                );
                Ok(())
            }
        }
    }

    /// Run the server with a specific listener, without a shutdown signal
    ///
    /// Used with a listener bound to port 0.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.serve_until(listener, std::future::pending(), Duration::ZERO)
            .await
    }

    /// Bind a random port, serve in a background task and return the address
    #[cfg(test)]
    pub async fn spawn_test_server(
        state: AppState,
    ) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self::with_state(state);
        let handle = tokio::spawn(async move {
            server.run_with_listener(listener).await.ok();
        });

        (addr, handle)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
