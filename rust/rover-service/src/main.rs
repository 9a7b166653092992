use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use rover_service::bridge::CarBridge;
use rover_service::config::Config;
use rover_service::log_store::DetectionLog;
use rover_service::{build_router, AppState, EVENT_CHANNEL_CAPACITY};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env()?;
    let addr = cfg.addr()?;
    let (events, _) = broadcast::channel::<String>(EVENT_CHANNEL_CAPACITY);
    let bridge = CarBridge::new(cfg.car_endpoints(), cfg.retry_delay, cfg.round_delay, events.clone()).spawn();
    let state = AppState::new(bridge, events, DetectionLog::new(cfg.log_path.clone()), cfg.grid_size);
    let app = build_router(state);

    tracing::info!(
        core_version = %rover_core::version(),
        addr = %addr,
        cars = ?cfg.car_ips,
        log = %cfg.log_path.display(),
        "starting rover-service"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

