//! Grid path to motion command compiler.
//!
//! Walks the waypoints once, keeping a heading (initially East) and a cursor.
//! Each unit step emits the turns needed to face it, tagged with the cursor
//! index, followed by one forward tagged with the destination index.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::command::{CommandKind, MotionCommand};
use crate::error::CompileError;
use crate::heading::INITIAL_HEADING;
use crate::path::{Path, Waypoint};

/// What to do with a consecutive pair that is not a unit orthogonal step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPolicy {
    /// Drop the offending waypoint; the cursor stays put.
    #[default]
    Skip,
    /// Fail with [`CompileError::InvalidPathSegment`] before emitting anything.
    Reject,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub invalid_segments: SegmentPolicy,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self { invalid_segments: SegmentPolicy::Reject }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct PathCompiler {
    options: CompileOptions,
}

impl PathCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn compile_path(&self, path: &Path) -> Result<Vec<MotionCommand>, CompileError> {
        self.compile(path.waypoints())
    }

    pub fn compile(&self, waypoints: &[Waypoint]) -> Result<Vec<MotionCommand>, CompileError> {
        let Some(&start) = waypoints.first() else {
            return Err(CompileError::EmptyPath);
        };
        if self.options.invalid_segments == SegmentPolicy::Reject {
            validate_segments(waypoints)?;
        }

        let mut out = Vec::with_capacity(waypoints.len() * 2);
        let mut heading = INITIAL_HEADING;
        let mut cursor = start;
        let mut position_index = 0usize;

        for (i, &target) in waypoints.iter().enumerate().skip(1) {
            let Some(desired) = cursor.heading_to(target) else {
                warn!(index = i, from = %cursor, to = %target, "skipping non-adjacent waypoint");
                continue;
            };
            for turn in heading.turns_to(desired) {
                out.push(MotionCommand { kind: CommandKind::from(turn), index: position_index });
                heading = heading.turned(turn);
            }
            debug_assert_eq!(heading, desired);
            out.push(MotionCommand::forward(i));
            cursor = target;
            position_index = i;
        }
        Ok(out)
    }
}

/// Compile with the default (skipping) policy.
pub fn compile(waypoints: &[Waypoint]) -> Result<Vec<MotionCommand>, CompileError> {
    PathCompiler::default().compile(waypoints)
}

/// First consecutive pair that is not a unit orthogonal step, as an error.
pub fn validate_segments(waypoints: &[Waypoint]) -> Result<(), CompileError> {
    if waypoints.is_empty() {
        return Err(CompileError::EmptyPath);
    }
    for (i, pair) in waypoints.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        if from.heading_to(to).is_none() {
            return Err(CompileError::InvalidPathSegment { index: i + 1, from, to });
        }
    }
    Ok(())
}

/// Waypoint index for each command, in command order.
pub fn progress_indices(cmds: &[MotionCommand]) -> Vec<usize> {
    cmds.iter().map(|c| c.index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(v: &[(i32, i32)]) -> Vec<Waypoint> {
        v.iter().copied().map(Waypoint::from).collect()
    }

    #[test]
    fn single_waypoint_yields_nothing() {
        assert!(compile(&wp(&[(0, 0)])).unwrap().is_empty());
        assert!(compile(&wp(&[(4, 7)])).unwrap().is_empty());
    }

    #[test]
    fn empty_path_is_invalid_argument() {
        assert_eq!(compile(&[]), Err(CompileError::EmptyPath));
        assert_eq!(PathCompiler::new(CompileOptions::strict()).compile(&[]), Err(CompileError::EmptyPath));
    }

    #[test]
    fn east_step_needs_no_turn() {
        assert_eq!(compile(&wp(&[(0, 0), (1, 0)])).unwrap(), vec![MotionCommand::forward(1)]);
    }

    #[test]
    fn south_step_is_one_right() {
        assert_eq!(
            compile(&wp(&[(0, 0), (0, 1)])).unwrap(),
            vec![MotionCommand::turn_right(0), MotionCommand::forward(1)]
        );
    }

    #[test]
    fn north_step_is_one_left() {
        assert_eq!(
            compile(&wp(&[(0, 0), (0, -1)])).unwrap(),
            vec![MotionCommand::turn_left(0), MotionCommand::forward(1)]
        );
    }

    #[test]
    fn reversal_is_two_rights() {
        assert_eq!(
            compile(&wp(&[(0, 0), (-1, 0)])).unwrap(),
            vec![MotionCommand::turn_right(0), MotionCommand::turn_right(0), MotionCommand::forward(1)]
        );
    }

    #[test]
    fn square_path() {
        let got = compile(&wp(&[(0, 0), (1, 0), (1, 1), (0, 1)])).unwrap();
        assert_eq!(
            got,
            vec![
                MotionCommand::forward(1),
                MotionCommand::turn_right(1),
                MotionCommand::forward(2),
                MotionCommand::turn_right(2),
                MotionCommand::forward(3),
            ]
        );
        assert_eq!(progress_indices(&got), vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn diagonal_is_skipped_by_default() {
        assert!(compile(&wp(&[(0, 0), (1, 1)])).unwrap().is_empty());
    }

    #[test]
    fn skip_keeps_cursor_on_last_good_waypoint() {
        // (5,5) is dropped; (1,0) is still one step east of the origin.
        let got = compile(&wp(&[(0, 0), (5, 5), (1, 0)])).unwrap();
        assert_eq!(got, vec![MotionCommand::forward(2)]);
    }

    #[test]
    fn strict_mode_reports_first_bad_segment() {
        let c = PathCompiler::new(CompileOptions::strict());
        let err = c.compile(&wp(&[(0, 0), (1, 0), (2, 1)])).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidPathSegment { index: 2, from: Waypoint::new(1, 0), to: Waypoint::new(2, 1) }
        );
        assert!(c.compile(&wp(&[(0, 0), (1, 0), (1, 1)])).is_ok());
    }

    #[test]
    fn zero_length_step_is_a_bad_segment() {
        let err = validate_segments(&wp(&[(0, 0), (0, 0)])).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPathSegment { index: 1, .. }));
    }

    #[test]
    fn far_jump_across_the_plane_is_not_a_step() {
        let far = wp(&[(i32::MIN, 0), (i32::MAX, 0)]);
        assert!(compile(&far).unwrap().is_empty());
        let err = PathCompiler::new(CompileOptions::strict()).compile(&far).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidPathSegment { index: 1, from: Waypoint::new(i32::MIN, 0), to: Waypoint::new(i32::MAX, 0) }
        );

        let back = wp(&[(0, i32::MAX), (0, i32::MIN), (1, i32::MAX)]);
        assert_eq!(compile(&back).unwrap(), vec![MotionCommand::forward(2)]);
    }
}
