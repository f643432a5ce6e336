//! DogWatch agent binary.
//!
//! One process, three tasks: the detection loop (the single pipeline
//! writer), the read-only API server, and the health heartbeat.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dogwatch_agent::{build_source, AgentConfig, DetectionLoop};
use dogwatch_api::{serve, ApiConfig, AppState};
use dogwatch_notify::{HealthHeartbeat, NotificationThrottle, NotificationTransport, NtfyTransport};
use dogwatch_storage::{FrameStore, StatusPublisher};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("dogwatch=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
            )
            .with(env_filter)
            .init();
    }

    info!("Starting dogwatch-agent");

    // Load configuration
    let config = AgentConfig::from_env();
    let api_config = ApiConfig::from_env();
    info!("Agent config: {:?}", config);

    // Open on-disk state; both self-correct leftovers from a previous run
    let frames = match FrameStore::open(&config.frame_dir, config.frame_capacity, config.jpeg_quality).await {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("Failed to open frame store: {}", e);
            std::process::exit(1);
        }
    };
    let status = Arc::new(StatusPublisher::open(&config.status_file).await);
    let last_dog_seen = status.current().await.last_dog_seen;

    // Notification stack
    let transport: Arc<dyn NotificationTransport> = match NtfyTransport::from_env() {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("Failed to create notification transport: {}", e);
            std::process::exit(1);
        }
    };
    let throttle = NotificationThrottle::new(Arc::clone(&transport), config.notify_cooldown);
    let heartbeat = HealthHeartbeat::new(Arc::clone(&transport), config.heartbeat_interval);

    // Inference source
    let source = match build_source().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create inference source: {}", e);
            std::process::exit(1);
        }
    };

    // Shutdown is observed between cycles, never mid-cycle
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    // Read-only serving side
    let app_state = AppState::new(api_config, Arc::clone(&status), Arc::clone(&frames));
    let api_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = serve(app_state, api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    tokio::spawn(heartbeat.run(shutdown_rx.clone()));

    // Run the detection loop on the main task
    let mut detection = DetectionLoop::new(config, source, frames, status, throttle, last_dog_seen);
    if let Err(e) = detection.run(shutdown_rx).await {
        error!("Detection loop failed: {}", e);
        std::process::exit(1);
    }

    info!("Agent shutdown complete");
}
