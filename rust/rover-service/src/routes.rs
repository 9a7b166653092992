use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rover_core::detections::{class_counts, latest_with_detections, parse_sessions, ClassCount};
use rover_core::profile::{clamp_angle, clamp_speed};
use rover_core::{
    plan_drive, progress_indices, CompileOptions, DrivePlan, DriveProfile, MotionCommand, MotorCommand, Path,
    PathCompiler, Waypoint,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, info_span};

use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeasurementRequest {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct AppendRequest {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompileRequest {
    /// Waypoints to compile; the session path when absent.
    pub waypoints: Option<Vec<Waypoint>>,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
pub struct PathView {
    pub path: Path,
    pub commands: Vec<MotionCommand>,
    pub moves: String,
    pub progress_indices: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    #[serde(flatten)]
    pub view: PathView,
    pub plan: DrivePlan,
    pub total_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub label: String,
    pub lines: usize,
    pub counts: Vec<ClassCount>,
}

fn view(path: Path, options: CompileOptions) -> Result<PathView, AppError> {
    let commands = PathCompiler::new(options).compile_path(&path)?;
    Ok(PathView {
        moves: commands.iter().map(|c| c.kind.code()).collect(),
        progress_indices: progress_indices(&commands),
        commands,
        path,
    })
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(Healthz { status: "ok" }))
}

pub async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = rover_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.link.status())
}

pub async fn command(State(state): State<AppState>, Json(cmd): Json<MotorCommand>) -> Result<impl IntoResponse, AppError> {
    // Frames from the dashboard are already in wire convention; only clamp.
    let cmd = MotorCommand {
        left: clamp_speed(cmd.left),
        right: clamp_speed(cmd.right),
        pan: clamp_angle(cmd.pan),
        tilt: clamp_angle(cmd.tilt),
    };
    let delivered = state.link.send(&cmd).await?;
    Ok(Json(json!({"ok": true, "delivered": delivered})))
}

pub async fn start_log_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.start_session() {
        Ok(pos) => Json(json!({"ok": true, "start_pos": pos})),
        Err(e) => {
            error!(error = %e, "start-log-session failed");
            Json(json!({"ok": false, "error": e.to_string()}))
        }
    }
}

pub async fn log_entries(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.read_new_entries() {
        Ok(entries) => Json(json!({"ok": true, "entries": entries})),
        Err(e) => Json(json!({"ok": false, "error": e.to_string()})),
    }
}

pub async fn end_log_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.end_session() {
        Ok(()) => Json(json!({"ok": true})),
        Err(e) => Json(json!({"ok": false, "error": e.to_string()})),
    }
}

pub async fn start_measurement(
    State(state): State<AppState>,
    body: Option<Json<MeasurementRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let session_id = state.log.start_measurement(&req.label, chrono::Local::now())?;
    Ok(Json(json!({"ok": true, "session_id": session_id})))
}

pub async fn detections(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let text = state.log.read_all()?;
    let sessions = parse_sessions(&text);
    let latest = latest_with_detections(&sessions).map(|s| s.session_id.clone());
    let summaries: Vec<SessionSummary> = sessions
        .iter()
        .map(|s| SessionSummary {
            session_id: s.session_id.clone(),
            label: s.label.clone(),
            lines: s.lines.len(),
            counts: s.class_counts(),
        })
        .collect();
    Ok(Json(json!({
        "sessions": summaries,
        "latest_with_detections": latest,
        "totals": class_counts(&text),
    })))
}

pub async fn get_path(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let path = state.planner.snapshot()?;
    Ok(Json(view(path, CompileOptions::default())?))
}

pub async fn append_waypoint(
    State(state): State<AppState>,
    Json(req): Json<AppendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path = state.planner.append(Waypoint::new(req.x, req.y))?;
    Ok(Json(view(path, CompileOptions::default())?))
}

pub async fn reset_path(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let path = state.planner.reset()?;
    Ok(Json(view(path, CompileOptions::default())?))
}

pub async fn compile_path(
    State(state): State<AppState>,
    body: Option<Json<CompileRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let path = match req.waypoints {
        Some(w) => Path::from_waypoints(w),
        None => state.planner.snapshot()?,
    };
    let options = if req.strict { CompileOptions::strict() } else { CompileOptions::default() };
    let compiled = view(path, options)?;
    let plan = plan_drive(&compiled.commands, &state.profile.load());
    let total_ms = plan.total_ms();
    Ok(Json(CompileResponse { view: compiled, plan, total_ms }))
}

pub async fn run_path(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let span = info_span!("run_path");
    let _enter = span.enter();

    let path = state.planner.snapshot()?;
    let commands = PathCompiler::default().compile_path(&path)?;
    let profile = state.profile.load_full();
    let plan = plan_drive(&commands, &profile);
    let (steps, total_ms) = (plan.len(), plan.total_ms());
    let stop = MotorCommand::stop(profile.pan, profile.tilt);
    state.runner.start(plan, stop).map_err(|e| AppError::Conflict(e.to_string()))?;
    info!(waypoints = path.len(), steps, total_ms, "path run started");
    Ok((StatusCode::ACCEPTED, Json(json!({"started": true, "steps": steps, "total_ms": total_ms}))))
}

pub async fn stop_path(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.runner.stop();
    Json(json!({"stopped": stopped}))
}

pub async fn path_progress(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.runner.progress())
}

pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profile.load_full().as_ref().clone())
}

pub async fn put_profile(State(state): State<AppState>, Json(profile): Json<DriveProfile>) -> impl IntoResponse {
    let profile = profile.clamped();
    state.profile.store(std::sync::Arc::new(profile.clone()));
    Json(profile)
}
