use std::sync::Arc;

use route_sequencer::config::Config;
use route_sequencer::error::AppError;
use route_sequencer::location::{Gazetteer, LocationService};
use route_sequencer::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let location: Arc<dyn LocationService> = match &config.gazetteer_path {
        Some(path) => Arc::new(
            Gazetteer::from_file(path, config.reverse_geocode_radius_km)
                .map_err(|err| AppError::Internal(err.to_string()))?,
        ),
        None => {
            tracing::warn!("GAZETTEER_PATH not set; deliveries need both address and coordinate");
            Arc::new(Gazetteer::empty())
        }
    };

    let shared_state = Arc::new(AppState::new(&config, location));
    let app = route_sequencer::api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        price_per_stop = config.price_per_stop,
        "http server started"
    );

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
