use serde::{Deserialize, Serialize};

pub const DEFAULT_FORWARD_SPEED: i32 = 150;
pub const DEFAULT_FORWARD_MS: u64 = 5_000;
pub const DEFAULT_TURN_SPEED: i32 = 120;
pub const DEFAULT_TURN_MS: u64 = 2_000;
pub const DEFAULT_SETTLE_MS: u64 = 500; // after each stop
pub const DEFAULT_PAUSE_MS: u64 = 200; // between moves
pub const CENTER_ANGLE: i32 = 90;

pub const MAX_WHEEL_SPEED: i32 = 255;
pub const MAX_SERVO_ANGLE: i32 = 180;

/// Speeds, durations and camera angles used when driving a compiled path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveProfile {
    pub forward_speed: i32,
    pub forward_ms: u64,
    pub turn_speed: i32,
    pub turn_ms: u64,
    pub settle_ms: u64,
    pub pause_ms: u64,
    pub pan: i32,
    pub tilt: i32,
}

impl Default for DriveProfile {
    fn default() -> Self {
        Self {
            forward_speed: DEFAULT_FORWARD_SPEED,
            forward_ms: DEFAULT_FORWARD_MS,
            turn_speed: DEFAULT_TURN_SPEED,
            turn_ms: DEFAULT_TURN_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            pause_ms: DEFAULT_PAUSE_MS,
            pan: CENTER_ANGLE,
            tilt: CENTER_ANGLE,
        }
    }
}

impl DriveProfile {
    /// Copy with speeds and angles pulled into the motor and servo ranges.
    pub fn clamped(&self) -> Self {
        Self {
            forward_speed: clamp_speed(self.forward_speed),
            turn_speed: clamp_speed(self.turn_speed),
            pan: clamp_angle(self.pan),
            tilt: clamp_angle(self.tilt),
            ..self.clone()
        }
    }
}

#[inline]
pub fn clamp_speed(v: i32) -> i32 {
    v.clamp(-MAX_WHEEL_SPEED, MAX_WHEEL_SPEED)
}

#[inline]
pub fn clamp_angle(v: i32) -> i32 {
    v.clamp(0, MAX_SERVO_ANGLE)
}
