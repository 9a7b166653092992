//! Detector log parsing.
//!
//! The detector appends one line per tracked object crossing the frame edge:
//! `2024-05-01 12:00:00 | ID: 4 | class: person | x: 120 | y: 88`.
//! Measurement markers split the log into sessions:
//! `=== SESSION_START: 20240501120000 hallway ===`.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DetectionParseError;

pub const SESSION_ID_FORMAT: &str = "%Y%m%d%H%M%S";

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"class: ([^|]+?)(?:\s*\||$)").expect("class regex"))
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^=== SESSION_START: (\S+)(.*)===$").expect("marker regex"))
}

fn record_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?) \| ID: (\d+) \| class: (.+?) \| x: (-?\d+) \| y: (-?\d+)\s*$").expect("record regex")
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub timestamp: String,
    pub track_id: u64,
    pub class: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    #[serde(rename = "type")]
    pub class: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSession {
    pub session_id: String,
    pub label: String,
    pub lines: Vec<String>,
}

impl MeasurementSession {
    pub fn has_detections(&self) -> bool {
        self.lines.iter().any(|l| l.contains("class: "))
    }

    pub fn class_counts(&self) -> Vec<ClassCount> {
        count_lines(self.lines.iter().map(String::as_str))
    }
}

pub fn parse_detection(line: &str) -> Result<DetectionRecord, DetectionParseError> {
    let err = || DetectionParseError { line: line.to_string() };
    let caps = record_re().captures(line).ok_or_else(err)?;
    Ok(DetectionRecord {
        timestamp: caps[1].trim().to_string(),
        track_id: caps[2].parse().map_err(|_| err())?,
        class: caps[3].trim().to_string(),
        x: caps[4].parse().map_err(|_| err())?,
        y: caps[5].parse().map_err(|_| err())?,
    })
}

/// Detection counts per class, in first-seen order.
pub fn class_counts(text: &str) -> Vec<ClassCount> {
    count_lines(text.lines())
}

fn count_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<ClassCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for line in lines.filter(|l| !l.is_empty()) {
        if let Some(caps) = class_re().captures(line) {
            *counts.entry(caps[1].trim().to_string()).or_insert(0) += 1;
        }
    }
    counts.into_iter().map(|(class, count)| ClassCount { class, count }).collect()
}

/// Split a log into measurement sessions. Lines before the first marker
/// belong to no session and are dropped.
pub fn parse_sessions(text: &str) -> Vec<MeasurementSession> {
    let mut sessions = Vec::new();
    let mut current: Option<MeasurementSession> = None;
    for line in text.lines().filter(|l| !l.is_empty()) {
        if let Some(caps) = marker_re().captures(line) {
            if let Some(done) = current.take() {
                sessions.push(done);
            }
            current = Some(MeasurementSession {
                session_id: caps[1].to_string(),
                label: caps[2].trim().to_string(),
                lines: Vec::new(),
            });
        } else if let Some(s) = current.as_mut() {
            s.lines.push(line.to_string());
        }
    }
    sessions.extend(current);
    sessions
}

pub fn latest_with_detections(sessions: &[MeasurementSession]) -> Option<&MeasurementSession> {
    sessions.iter().rev().find(|s| s.has_detections())
}

pub fn session_marker(session_id: &str, label: &str) -> String {
    format!("=== SESSION_START: {session_id} {label} ===\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2024-05-01 11:59:00 | ID: 1 | class: cat | x: 5 | y: 5
=== SESSION_START: 20240501120000 hallway ===
2024-05-01 12:00:01 | ID: 2 | class: person | x: 12 | y: 40
2024-05-01 12:00:02 | ID: 3 | class: dog | x: 300 | y: 41
2024-05-01 12:00:03 | ID: 4 | class: person | x: 301 | y: 42
=== SESSION_START: 20240501121500  ===
";

    #[test]
    fn counts_keep_first_seen_order() {
        let counts = class_counts(LOG);
        let flat: Vec<(&str, usize)> = counts.iter().map(|c| (c.class.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("cat", 1), ("person", 2), ("dog", 1)]);
    }

    #[test]
    fn class_at_line_end_is_counted() {
        let counts = class_counts("t | class: traffic light");
        assert_eq!(counts, vec![ClassCount { class: "traffic light".into(), count: 1 }]);
    }

    #[test]
    fn sessions_split_on_markers() {
        let sessions = parse_sessions(LOG);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "20240501120000");
        assert_eq!(sessions[0].label, "hallway");
        assert_eq!(sessions[0].lines.len(), 3);
        assert_eq!(sessions[1].label, "");
        assert!(sessions[1].lines.is_empty());
        assert_eq!(latest_with_detections(&sessions).map(|s| s.session_id.as_str()), Some("20240501120000"));
    }

    #[test]
    fn marker_round_trips_through_parser() {
        let text = session_marker("20240101000000", "lab run");
        let sessions = parse_sessions(&text);
        assert_eq!(sessions[0].session_id, "20240101000000");
        assert_eq!(sessions[0].label, "lab run");
    }

    #[test]
    fn parses_full_record() {
        let r = parse_detection("2024-05-01 12:00:01 | ID: 2 | class: person | x: 12 | y: 40").unwrap();
        assert_eq!(r.track_id, 2);
        assert_eq!(r.class, "person");
        assert_eq!((r.x, r.y), (12, 40));
        assert!(parse_detection("=== SESSION_START: 1 x ===").is_err());
    }
}
