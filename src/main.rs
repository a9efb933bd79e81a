use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rider_dispatch::collaborators::memory::{
    InMemoryAssetStore, InMemoryDirectory, InMemoryGeocoder, InMemoryOrderLedger, LogNotifier,
};
use rider_dispatch::collaborators::Collaborators;
use rider_dispatch::engine::sweeper::run_offer_sweeper;
use rider_dispatch::error::AppError;
use rider_dispatch::fixtures::Fixtures;
use rider_dispatch::{api, config, state};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let geocoder = Arc::new(InMemoryGeocoder::new());
    let ledger = Arc::new(InMemoryOrderLedger::new());
    let directory = Arc::new(InMemoryDirectory::new());

    if let Ok(path) = std::env::var("FIXTURES_PATH") {
        Fixtures::load(&PathBuf::from(path))?.apply(&geocoder, &ledger, &directory);
    }

    let collaborators = Collaborators {
        geocoder,
        notifier: Arc::new(LogNotifier),
        assets: Arc::new(InMemoryAssetStore::new()),
        ledger,
        directory,
    };

    let offer_timeout = config.dispatch.offer_timeout;
    let shared_state = Arc::new(state::AppState::new(
        collaborators,
        config.dispatch.clone(),
        config.event_buffer_size,
        Duration::from_secs(config.session_ttl_secs),
    )
    .with_dev_sessions(config.enable_dev_sessions));

    let app = api::rest::router(shared_state.clone());

    if let Some(timeout) = offer_timeout {
        tokio::spawn(run_offer_sweeper(
            shared_state.clone(),
            timeout,
            Duration::from_secs(config.sweep_interval_secs.max(1)),
        ));
    }

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
