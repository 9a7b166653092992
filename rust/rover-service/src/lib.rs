use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{routing::{get, post}, Router};
use rover_core::DriveProfile;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use crate::bridge::RoverLink;
use crate::dispatcher::PathRunner;
use crate::log_store::DetectionLog;
use crate::session::PlannerSession;

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod log_store;
pub mod routes;
pub mod session;
pub mod ws;

/// Capacity of the telemetry/event fan-out to dashboard clients.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub link: Arc<dyn RoverLink>,
    pub events: broadcast::Sender<String>,
    pub planner: Arc<PlannerSession>,
    pub profile: Arc<ArcSwap<DriveProfile>>, // atomic swap
    pub runner: Arc<PathRunner>,
    pub log: Arc<DetectionLog>,
}

impl AppState {
    pub fn new(link: Arc<dyn RoverLink>, events: broadcast::Sender<String>, log: DetectionLog, grid_size: i32) -> Self {
        let runner = Arc::new(PathRunner::new(Arc::clone(&link), events.clone()));
        Self {
            link,
            events,
            planner: Arc::new(PlannerSession::new(grid_size)),
            profile: Arc::new(ArcSwap::from_pointee(DriveProfile::default())),
            runner,
            log: Arc::new(log),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/version", get(routes::version))
        .route("/status", get(routes::status))
        .route("/command", post(routes::command))
        .route("/ws", get(ws::ws_handler))
        .route("/start-log-session", post(routes::start_log_session))
        .route("/log-entries", get(routes::log_entries))
        .route("/end-log-session", post(routes::end_log_session))
        .route("/start-measurement", post(routes::start_measurement))
        .route("/detections", get(routes::detections))
        .route("/path", get(routes::get_path))
        .route("/path/waypoints", post(routes::append_waypoint))
        .route("/path/reset", post(routes::reset_path))
        .route("/path/compile", post(routes::compile_path))
        .route("/path/run", post(routes::run_path))
        .route("/path/stop", post(routes::stop_path))
        .route("/path/progress", get(routes::path_progress))
        .route("/profile", get(routes::get_profile).put(routes::put_profile))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
