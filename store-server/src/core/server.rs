//! HTTP server lifecycle

use crate::api;
use crate::core::ServerState;
use crate::utils::AppError;
use tokio::net::TcpListener;

pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn with_state(state: ServerState) -> Self {
        Self { state }
    }

    /// Bind and serve until ctrl-c
    pub async fn run(self) -> Result<(), AppError> {
        let addr = format!("0.0.0.0:{}", self.state.config.http_port);
        let app = api::build_app(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!(%addr, environment = %self.state.config.environment, "Store server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
