//! Read-only HTTP surface for the DogWatch agent.
//!
//! Serves the status snapshot, the frame listing, frame bytes, a small
//! dashboard page, and a health endpoint. Handlers never mutate pipeline
//! state; they only read the status publisher and the frame store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

use tokio::sync::watch;
use tracing::info;

/// Bind and serve the API until the shutdown signal flips.
pub async fn serve(state: AppState, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on {}", addr);

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
            info!("API server shutting down");
        })
        .await?;

    Ok(())
}
