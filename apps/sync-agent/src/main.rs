//! Deskboard Sync Agent Binary
//!
//! Starts the dashboard data sync agent.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sync-agent
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `DESKBOARD_API_BASE_URL`: Base URL of the record REST API
//! - `DESKBOARD_SESSION_TOKEN`: Bearer token for REST requests
//!
//! ## Optional
//! - `DESKBOARD_STREAM_URL`: Live feed WebSocket URL (no live feed without it)
//! - `DESKBOARD_STREAM_TOKEN`: Token for the feed connection
//! - `DESKBOARD_DEMO_FEED`: Run the demo feed (default: on when no stream URL)
//! - `DESKBOARD_REFRESH_INTERVAL_SECS`: Record refetch cadence, 0 = off (default: 30)
//! - `DESKBOARD_RECONNECT_DELAY_INITIAL_MS`: First reconnect delay (default: 1000)
//! - `DESKBOARD_RECONNECT_DELAY_MAX_SECS`: Reconnect delay cap (default: 30)
//! - `DESKBOARD_RECONNECT_DELAY_MULTIPLIER`: Backoff multiplier (default: 2.0)
//! - `DESKBOARD_RECONNECT_MAX_ATTEMPTS`: Attempt budget, 0 = unlimited (default: 5)
//! - `DESKBOARD_API_TIMEOUT_SECS`: REST request timeout (default: 10)
//! - `DESKBOARD_HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: deskboard-sync-agent)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use sync_agent::application::services::{
    DemoFeed, DemoFeedConfig, FeedService, RecordSyncConfig, RecordSyncService,
};
use sync_agent::application::store::RecordStore;
use sync_agent::domain::connection::{FeedKind, FeedState};
use sync_agent::domain::timeseries::{FeedEvent, SeriesBuffer};
use sync_agent::infrastructure::api::{HttpRecordApi, RecordApiConfig};
use sync_agent::infrastructure::broadcast::SampleHub;
use sync_agent::infrastructure::health::{HealthServer, HealthServerState};
use sync_agent::infrastructure::stream::{StreamClient, StreamClientConfig};
use sync_agent::infrastructure::telemetry;
use sync_agent::{AgentConfig, init_metrics};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Deskboard Sync Agent");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = AgentConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Initialize sample hub for fan-out to chart consumers
    let hub = Arc::new(SampleHub::with_defaults());

    // Initialize the record API client and store
    let mut api_config = RecordApiConfig::new(config.api_base_url.clone(), config.session.reveal());
    api_config.timeout = config.api_timeout;
    let api = Arc::new(HttpRecordApi::new(&api_config)?);
    let store = Arc::new(RecordStore::new(api));

    // Prime the record cache; the agent still starts if the API is down
    if let Err(e) = store.refresh().await {
        tracing::warn!(error = %e, "Initial record refresh failed");
    } else {
        tracing::info!(
            records = store.records().len(),
            version = store.version(),
            "Record cache primed"
        );
    }

    // Background refetch keeps the mirror in step with other editors
    if !config.refresh_interval.is_zero() {
        let sync_service = RecordSyncService::new(
            RecordSyncConfig {
                interval: config.refresh_interval,
            },
            Arc::clone(&store),
            shutdown_token.clone(),
        );
        tokio::spawn(sync_service.run());
    }

    let mut health_feeds: Vec<Arc<FeedState>> = Vec::new();

    // Live feed: WebSocket client + feed service
    if let Some(url) = &config.stream_url {
        let live_state = Arc::new(FeedState::new(FeedKind::Live));
        health_feeds.push(Arc::clone(&live_state));

        let (live_tx, live_rx) = mpsc::channel::<FeedEvent>(1024);
        let live_buffer = Arc::new(RwLock::new(SeriesBuffer::new()));

        let live_service = FeedService::new(
            Arc::clone(&live_buffer),
            Arc::clone(&live_state),
            Arc::clone(&hub),
        );
        tokio::spawn(live_service.run(live_rx));

        let mut stream_config = StreamClientConfig::new(url.clone());
        if let Some(token) = &config.stream_token {
            stream_config = stream_config.with_token(token.reveal());
        }
        stream_config.reconnect = config.reconnect.clone().into();

        let live_client = Arc::new(StreamClient::new(
            stream_config,
            live_tx,
            shutdown_token.clone(),
            Arc::clone(&live_state),
        ));
        tokio::spawn(async move {
            if let Err(e) = live_client.run().await {
                tracing::error!(error = %e, "Live feed client error");
            }
        });
    }

    // Demo feed: locally generated samples through the same pipeline
    if config.demo_feed {
        let demo_state = Arc::new(FeedState::new(FeedKind::Demo));
        health_feeds.push(Arc::clone(&demo_state));

        let (demo_tx, demo_rx) = mpsc::channel::<FeedEvent>(256);
        let demo_buffer = Arc::new(RwLock::new(SeriesBuffer::new()));

        let demo_service = FeedService::new(
            Arc::clone(&demo_buffer),
            Arc::clone(&demo_state),
            Arc::clone(&hub),
        );
        tokio::spawn(demo_service.run(demo_rx));

        let demo_feed = DemoFeed::new(DemoFeedConfig::default(), demo_tx, shutdown_token.clone());
        tokio::spawn(demo_feed.run());
    }

    // Initialize health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        health_feeds,
        Arc::clone(&hub),
    ));
    let health_server = HealthServer::new(
        config.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Sync agent ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Sync agent stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &AgentConfig) {
    tracing::info!(
        api_base_url = %config.api_base_url,
        live_feed = config.stream_url.is_some(),
        demo_feed = config.demo_feed,
        health_port = config.health_port,
        "Configuration loaded"
    );
    if let Some(url) = &config.stream_url {
        tracing::debug!(stream_url = %url, "Live feed endpoint");
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
