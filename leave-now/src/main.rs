use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use leave_now::cache::CachedFeed;
use leave_now::config::{AppConfig, ConfigError, FeedSource};
use leave_now::feed::{FeedClient, FeedError, MockFeed, TransitFeed};
use leave_now::notify::TracingSink;
use leave_now::position::PositionCell;
use leave_now::registry::{MemoryRouteStore, RegistryError};
use leave_now::scheduler::PollingScheduler;
use leave_now::suppression::{
    JsonFileSuppressionStore, MemorySuppressionStore, SuppressionError, SuppressionGate,
    SuppressionStore,
};
use leave_now::web::{AppState, SharedGate, create_router};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Suppression(#[from] SuppressionError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Leave-now service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;

    match config.feed.clone() {
        FeedSource::Live(feed_config) => {
            info!(base_url = %feed_config.base_url, "Using live arrival feed");
            serve(FeedClient::new(feed_config)?, config).await
        }
        FeedSource::Mock(dir) => {
            let mock = MockFeed::load(&dir)?;
            info!(
                dir = %dir.display(),
                stops = mock.available_stops().await.len(),
                "Using mock arrival feed"
            );
            serve(mock, config).await
        }
    }
}

async fn serve<F: TransitFeed + 'static>(feed: F, config: AppConfig) -> Result<(), StartupError> {
    let feed = CachedFeed::new(feed, &config.cache);

    let routes = match &config.routes_file {
        Some(path) => MemoryRouteStore::load_json(path, Utc::now()).await?,
        None => {
            warn!("ROUTES_FILE not set, no routes to monitor");
            MemoryRouteStore::new()
        }
    };
    info!(routes = routes.len().await, "Loaded registered routes");

    let store: Box<dyn SuppressionStore> = match &config.suppression_file {
        Some(path) => Box::new(JsonFileSuppressionStore::open(path.clone())?),
        None => Box::new(MemorySuppressionStore::new()),
    };
    let gate: SharedGate = Arc::new(SuppressionGate::new(store));
    let position = PositionCell::new();

    let scheduler = PollingScheduler::new(
        feed,
        routes,
        position.clone(),
        TracingSink,
        gate.clone(),
        config.scheduler.clone(),
    );
    let state = AppState::new(position, gate, scheduler.subscribe_reports());
    let handle = scheduler.spawn();

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Control surface listening");
    info!("  GET  /health             - Health check");
    info!("  GET  /outcomes           - Last cycle report");
    info!("  POST /position           - Publish a position fix");
    info!("  GET  /suppression        - Dismissal state");
    info!("  POST /dismiss/:category  - Dismiss bus/weather/persistent alerts");
    info!("  POST /enable/:category   - Re-enable a category");

    let served = axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    handle.stop().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
