//! Startup helpers for the assistant server.

use std::process::ExitCode;

use crate::core::config::AssistantConfig;
use crate::core::errors::AssistantResult;
use crate::server::{self, AppState};

/// Run the webhook server (used by the `travigo-assistant` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting Travigo assistant v{}", env!("CARGO_PKG_VERSION"));

    let config = match AssistantConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(&config)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Install the global `fmt` subscriber with `RUST_LOG` support and an INFO floor.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

async fn serve(config: &AssistantConfig) -> AssistantResult<()> {
    let state = AppState::from_config(config).await?;
    server::run_server_with_shutdown(state, config.server.port, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
