//! Sequential dispatch of a drive plan to the car.
//!
//! Steps never overlap: drive frame, hold, stop frame, settle, pause, next.
//! One run at a time; a stop request interrupts the current wait and sends a
//! stop frame before the run ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rover_core::{CommandKind, DrivePlan, DriveStep, MotorCommand};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, info_span, warn, Instrument};

use crate::bridge::RoverLink;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    pub state: RunState,
    pub running: bool,
    pub command_index: usize,
    pub total: usize,
    pub waypoint_index: Option<usize>,
    pub kind: Option<CommandKind>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("a path run is already in progress")]
pub struct AlreadyRunning;

pub struct PathRunner {
    link: Arc<dyn RoverLink>,
    events: broadcast::Sender<String>,
    running: AtomicBool,
    progress: Mutex<RunProgress>,
    cancel: watch::Sender<bool>,
}

impl PathRunner {
    pub fn new(link: Arc<dyn RoverLink>, events: broadcast::Sender<String>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self { link, events, running: AtomicBool::new(false), progress: Mutex::new(RunProgress::default()), cancel }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> RunProgress {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Spawns the run. Fails if another run has not finished yet.
    pub fn start(self: &Arc<Self>, plan: DrivePlan, stop: MotorCommand) -> Result<(), AlreadyRunning> {
        if self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(AlreadyRunning);
        }
        self.cancel.send_replace(false);
        self.update(|p| {
            *p = RunProgress { state: RunState::Running, running: true, total: plan.len(), ..RunProgress::default() }
        });

        let runner = Arc::clone(self);
        let span = info_span!("path_run", steps = plan.len(), total_ms = plan.total_ms());
        tokio::spawn(
            async move {
                let state = match runner.execute(&plan).await {
                    Ok(true) => RunState::Completed,
                    Ok(false) => {
                        runner.send_stop(&stop, "cancel").await;
                        RunState::Cancelled
                    }
                    Err(e) => {
                        error!(error = %e, "path run failed");
                        runner.send_stop(&stop, "failure").await;
                        RunState::Failed
                    }
                };
                info!(?state, "path run finished");
                runner.finish(state);
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Requests cancellation. Returns false when nothing is running.
    pub fn stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel.send_replace(true);
        true
    }

    /// Ok(true) when every step ran, Ok(false) when cancelled.
    async fn execute(&self, plan: &DrivePlan) -> anyhow::Result<bool> {
        for step in &plan.steps {
            if self.cancelled() {
                return Ok(false);
            }
            self.begin_step(step, plan.len());
            if !self.link.send(&step.drive).await? {
                warn!(command_index = step.command_index, "drive frame not delivered");
            }
            if self.wait(step.hold_ms).await {
                return Ok(false);
            }
            self.link.send(&step.stop).await?;
            if self.wait(step.settle_ms).await || self.wait(step.pause_ms).await {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Final stop frame after an interrupted run.
    async fn send_stop(&self, stop: &MotorCommand, after: &'static str) {
        match self.link.send(stop).await {
            Ok(true) => {}
            Ok(false) => warn!(after, "stop frame not delivered"),
            Err(e) => error!(after, error = %e, "stop frame failed"),
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Sleeps for `ms`, returning true if cancellation arrived first.
    async fn wait(&self, ms: u64) -> bool {
        let mut rx = self.cancel.subscribe();
        if *rx.borrow_and_update() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => false,
            cancelled = async { rx.wait_for(|c| *c).await.is_ok() } => cancelled,
        }
    }

    fn begin_step(&self, step: &DriveStep, total: usize) {
        self.update(|p| {
            p.command_index = step.command_index;
            p.waypoint_index = Some(step.waypoint_index);
            p.kind = Some(step.kind);
        });
        let event = json!({
            "type": "path_progress",
            "command_index": step.command_index,
            "total": total,
            "waypoint_index": step.waypoint_index,
            "kind": step.kind,
        });
        let _ = self.events.send(event.to_string());
    }

    fn finish(&self, state: RunState) {
        self.update(|p| {
            p.state = state;
            p.running = false;
            if state == RunState::Completed {
                p.command_index = p.total;
            }
        });
        self.running.store(false, Ordering::Release);
        let _ = self.events.send(json!({ "type": "path_finished", "state": state }).to_string());
    }

    fn update(&self, f: impl FnOnce(&mut RunProgress)) {
        if let Ok(mut p) = self.progress.lock() {
            f(&mut p);
        }
    }
}
