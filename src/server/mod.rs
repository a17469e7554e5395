//! HTTP server for the assistant webhook.
//!
//! Endpoints:
//! - `POST /assistant/twilio/webhook`: Twilio Conversations events
//! - `GET /assistant/twilio/`: placeholder page
//! - `GET /health`: liveness

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::errors::AssistantResult;

/// Start the HTTP server.
///
/// # Errors
/// Returns an error if the listener cannot be bound or serving fails.
pub async fn run_server(state: Arc<AppState>, port: u16) -> AssistantResult<()> {
    run_server_with_shutdown(state, port, std::future::pending()).await
}

/// Start the HTTP server with graceful shutdown support.
///
/// The server will stop accepting new connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the listener cannot be bound or serving fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> AssistantResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app: Router = create_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Travigo assistant listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
