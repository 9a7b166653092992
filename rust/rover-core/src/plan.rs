//! Timed motor plan for a compiled path.

use serde::{Deserialize, Serialize};

use crate::command::{CommandKind, MotionCommand};
use crate::profile::{clamp_angle, clamp_speed, DriveProfile};

/// Frame sent to the car. `right` is already in the car's wheel convention
/// (mirrored motor), see [`MotorCommand::drive`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub left: i32,
    pub right: i32,
    pub pan: i32,
    pub tilt: i32,
}

impl MotorCommand {
    /// Build from logical wheel speeds. The right motor is mounted mirrored,
    /// so its value is negated on the wire.
    pub fn drive(left: i32, right: i32, pan: i32, tilt: i32) -> Self {
        Self { left: clamp_speed(left), right: -clamp_speed(right), pan: clamp_angle(pan), tilt: clamp_angle(tilt) }
    }

    pub fn stop(pan: i32, tilt: i32) -> Self {
        Self { left: 0, right: 0, pan: clamp_angle(pan), tilt: clamp_angle(tilt) }
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveStep {
    pub command_index: usize,
    pub waypoint_index: usize,
    pub kind: CommandKind,
    pub drive: MotorCommand,
    pub hold_ms: u64,
    pub stop: MotorCommand,
    pub settle_ms: u64,
    pub pause_ms: u64,
}

impl DriveStep {
    pub fn duration_ms(&self) -> u64 {
        self.hold_ms + self.settle_ms + self.pause_ms
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivePlan {
    pub steps: Vec<DriveStep>,
}

impl DrivePlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_ms(&self) -> u64 {
        self.steps.iter().map(DriveStep::duration_ms).sum()
    }
}

/// Logical (left, right) wheel speeds and hold time for one command.
pub fn wheel_speeds(kind: CommandKind, profile: &DriveProfile) -> (i32, i32, u64) {
    match kind {
        CommandKind::Forward => (profile.forward_speed, profile.forward_speed, profile.forward_ms),
        CommandKind::TurnRight => (profile.turn_speed, -profile.turn_speed, profile.turn_ms),
        CommandKind::TurnLeft => (-profile.turn_speed, profile.turn_speed, profile.turn_ms),
    }
}

pub fn plan_drive(cmds: &[MotionCommand], profile: &DriveProfile) -> DrivePlan {
    let profile = profile.clamped();
    let stop = MotorCommand::stop(profile.pan, profile.tilt);
    let steps = cmds
        .iter()
        .enumerate()
        .map(|(i, cmd)| {
            let (left, right, hold_ms) = wheel_speeds(cmd.kind, &profile);
            DriveStep {
                command_index: i,
                waypoint_index: cmd.index,
                kind: cmd.kind,
                drive: MotorCommand::drive(left, right, profile.pan, profile.tilt),
                hold_ms,
                stop,
                settle_ms: profile.settle_ms,
                pause_ms: profile.pause_ms,
            }
        })
        .collect();
    DrivePlan { steps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_wheel_is_mirrored_on_the_wire() {
        let m = MotorCommand::drive(150, 150, 90, 90);
        assert_eq!((m.left, m.right), (150, -150));
        assert_eq!(serde_json::to_value(m).unwrap(), serde_json::json!({"left":150,"right":-150,"pan":90,"tilt":90}));
    }

    #[test]
    fn plan_maps_each_kind() {
        let cmds = [MotionCommand::forward(1), MotionCommand::turn_right(1), MotionCommand::turn_left(2)];
        let plan = plan_drive(&cmds, &DriveProfile::default());
        assert_eq!(plan.len(), 3);

        let f = &plan.steps[0];
        assert_eq!((f.drive.left, f.drive.right, f.hold_ms), (150, -150, 5_000));

        let r = &plan.steps[1];
        assert_eq!((r.drive.left, r.drive.right, r.hold_ms), (120, 120, 2_000));
        assert_eq!(r.waypoint_index, 1);

        let l = &plan.steps[2];
        assert_eq!((l.drive.left, l.drive.right), (-120, -120));
        assert_eq!(l.command_index, 2);
        assert!(l.stop.is_stop());
    }

    #[test]
    fn total_time_includes_settle_and_pause() {
        let plan = plan_drive(&[MotionCommand::forward(1), MotionCommand::turn_right(1)], &DriveProfile::default());
        assert_eq!(plan.total_ms(), (5_000 + 500 + 200) + (2_000 + 500 + 200));
        assert_eq!(plan_drive(&[], &DriveProfile::default()).total_ms(), 0);
    }
}
