#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rover_core::MotorCommand;
use rover_service::bridge::{LinkStatus, RoverLink};
use rover_service::log_store::DetectionLog;
use rover_service::AppState;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Link that records every frame with the (possibly paused) tokio clock.
pub struct RecordingLink {
    pub connected: bool,
    pub sent: Mutex<Vec<(Instant, MotorCommand)>>,
}

impl RecordingLink {
    pub fn connected() -> Arc<Self> {
        Arc::new(Self { connected: true, sent: Mutex::new(Vec::new()) })
    }

    pub fn frames(&self) -> Vec<MotorCommand> {
        self.sent.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }

    pub fn timed(&self) -> Vec<(Instant, MotorCommand)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoverLink for RecordingLink {
    async fn send(&self, cmd: &MotorCommand) -> anyhow::Result<bool> {
        if !self.connected {
            return Ok(false);
        }
        self.sent.lock().unwrap().push((Instant::now(), *cmd));
        Ok(true)
    }

    fn status(&self) -> LinkStatus {
        LinkStatus {
            connected: self.connected,
            status: if self.connected { "Connected to mock".into() } else { "Disconnected".into() },
            endpoint: self.connected.then(|| "mock".to_string()),
        }
    }
}

pub fn make_state(link: Arc<RecordingLink>, log_path: &std::path::Path) -> AppState {
    let (events, _) = broadcast::channel(64);
    AppState::new(link, events, DetectionLog::new(log_path), 11)
}
