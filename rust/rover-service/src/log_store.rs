use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use rover_core::detections::{session_marker, SESSION_ID_FORMAT};
use tracing::info;

/// Detector log with a tail cursor for the dashboard's live view.
pub struct DetectionLog {
    path: PathBuf,
    cursor: Mutex<u64>,
}

impl DetectionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cursor: Mutex::new(0) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_cursor(&self) -> Result<std::sync::MutexGuard<'_, u64>> {
        self.cursor.lock().map_err(|_| anyhow!("log cursor poisoned"))
    }

    /// Moves the cursor to the current end of the log and returns it.
    pub fn start_session(&self) -> Result<u64> {
        let len = std::fs::metadata(&self.path)
            .with_context(|| format!("stat {}", self.path.display()))?
            .len();
        *self.lock_cursor()? = len;
        info!(start_pos = len, "log session started");
        Ok(len)
    }

    /// Text appended since the cursor; advances the cursor past it.
    pub fn read_new_entries(&self) -> Result<String> {
        let mut cursor = self.lock_cursor()?;
        let mut f = File::open(&self.path).with_context(|| format!("open {}", self.path.display()))?;
        let len = f.metadata()?.len();
        // Truncated or rotated underneath us.
        if *cursor > len {
            *cursor = 0;
        }
        f.seek(SeekFrom::Start(*cursor))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        *cursor += buf.len() as u64;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn end_session(&self) -> Result<()> {
        *self.lock_cursor()? = 0;
        Ok(())
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.lock().map(|c| *c).unwrap_or(0)
    }

    /// Appends a measurement marker and returns the new session id.
    pub fn start_measurement(&self, label: &str, now: DateTime<Local>) -> Result<String> {
        let session_id = now.format(SESSION_ID_FORMAT).to_string();
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {} for append", self.path.display()))?;
        f.write_all(session_marker(&session_id, label).as_bytes())?;
        info!(%session_id, label, "measurement started");
        Ok(session_id)
    }

    /// Whole log, or empty when the detector has not written anything yet.
    pub fn read_all(&self) -> Result<String> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn append(path: &Path, text: &str) {
        let mut f = OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn tails_only_new_lines() {
        let tmp = NamedTempFile::new().unwrap();
        append(tmp.path(), "old | class: cat\n");
        let log = DetectionLog::new(tmp.path());

        let start = log.start_session().unwrap();
        assert_eq!(start, 17);
        assert_eq!(log.read_new_entries().unwrap(), "");

        append(tmp.path(), "new | class: dog\n");
        assert_eq!(log.read_new_entries().unwrap(), "new | class: dog\n");
        assert_eq!(log.read_new_entries().unwrap(), "");

        log.end_session().unwrap();
        assert_eq!(log.cursor(), 0);
        assert!(log.read_new_entries().unwrap().starts_with("old"));
    }

    #[test]
    fn missing_log_fails_session_start() {
        let dir = tempfile::tempdir().unwrap();
        let log = DetectionLog::new(dir.path().join("absent.txt"));
        assert!(log.start_session().is_err());
        assert_eq!(log.read_all().unwrap(), "");
    }

    #[test]
    fn measurement_marker_uses_timestamp_id() {
        let dir = tempfile::tempdir().unwrap();
        let log = DetectionLog::new(dir.path().join("log.txt"));
        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap();
        let id = log.start_measurement("hall", now).unwrap();
        assert_eq!(id, "20240501123005");
        assert_eq!(log.read_all().unwrap(), "=== SESSION_START: 20240501123005 hall ===\n");
    }
}
