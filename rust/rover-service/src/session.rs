use std::sync::Mutex;

use anyhow::anyhow;
use rover_core::{Path, PathError, Waypoint};

/// Planner path for the dashboard session.
#[derive(Debug)]
pub struct PlannerSession {
    path: Mutex<Path>,
    grid_size: i32,
}

impl PlannerSession {
    pub fn new(grid_size: i32) -> Self {
        Self { path: Mutex::new(Path::origin()), grid_size }
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn snapshot(&self) -> anyhow::Result<Path> {
        self.path.lock().map(|p| p.clone()).map_err(|_| anyhow!("planner path poisoned"))
    }

    pub fn append(&self, w: Waypoint) -> Result<Path, AppendError> {
        let mut p = self.path.lock().map_err(|_| AppendError::Internal(anyhow!("planner path poisoned")))?;
        p.append_within(w, self.grid_size)?;
        Ok(p.clone())
    }

    pub fn reset(&self) -> anyhow::Result<Path> {
        let mut p = self.path.lock().map_err(|_| anyhow!("planner path poisoned"))?;
        p.reset();
        Ok(p.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    #[error(transparent)]
    Rejected(#[from] PathError),
    #[error(transparent)]
    Internal(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_reset() {
        let s = PlannerSession::new(11);
        let p = s.append(Waypoint::new(1, 0)).unwrap();
        assert_eq!(p.len(), 2);
        assert!(matches!(s.append(Waypoint::new(11, 0)), Err(AppendError::Rejected(_))));
        assert_eq!(s.reset().unwrap(), Path::origin());
    }
}
