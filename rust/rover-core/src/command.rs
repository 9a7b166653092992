use std::fmt;

use serde::{Deserialize, Serialize};

use crate::heading::TurnDirection;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Forward,
    TurnLeft,
    TurnRight,
}

impl CommandKind {
    /// Single-letter move code used by the dashboard (`F`, `L`, `R`).
    pub fn code(self) -> char {
        match self {
            CommandKind::Forward => 'F',
            CommandKind::TurnLeft => 'L',
            CommandKind::TurnRight => 'R',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(CommandKind::Forward),
            'L' => Some(CommandKind::TurnLeft),
            'R' => Some(CommandKind::TurnRight),
            _ => None,
        }
    }
}

impl From<TurnDirection> for CommandKind {
    fn from(d: TurnDirection) -> Self {
        match d {
            TurnDirection::Left => CommandKind::TurnLeft,
            TurnDirection::Right => CommandKind::TurnRight,
        }
    }
}

/// One compiled instruction, tagged with the path index it advances to
/// (forward) or is issued at (turns).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MotionCommand {
    pub kind: CommandKind,
    pub index: usize,
}

impl MotionCommand {
    pub const fn forward(index: usize) -> Self {
        Self { kind: CommandKind::Forward, index }
    }

    pub const fn turn_left(index: usize) -> Self {
        Self { kind: CommandKind::TurnLeft, index }
    }

    pub const fn turn_right(index: usize) -> Self {
        Self { kind: CommandKind::TurnRight, index }
    }

    pub fn is_turn(&self) -> bool {
        self.kind != CommandKind::Forward
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind.code(), self.index)
    }
}

/// Compact `F@1 R@1 F@2` rendering of a command list.
pub fn format_commands(cmds: &[MotionCommand]) -> String {
    cmds.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serializes_with_kind_and_index() {
        let v = serde_json::to_value(MotionCommand::turn_right(2)).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "turn_right", "index": 2}));
    }

    #[test]
    fn codes_round_trip() {
        for k in [CommandKind::Forward, CommandKind::TurnLeft, CommandKind::TurnRight] {
            assert_eq!(CommandKind::from_code(k.code()), Some(k));
        }
        assert_eq!(CommandKind::from_code('x'), None);
    }

    #[test]
    fn formats_compactly() {
        let cmds = [MotionCommand::forward(1), MotionCommand::turn_left(1)];
        assert_eq!(format_commands(&cmds), "F@1 L@1");
    }
}
