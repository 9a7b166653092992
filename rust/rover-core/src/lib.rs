pub mod command;
pub mod compiler;
pub mod detections;
pub mod error;
pub mod heading;
pub mod path;
pub mod plan;
pub mod profile;

pub use command::{CommandKind, MotionCommand};
pub use compiler::{progress_indices, validate_segments, CompileOptions, PathCompiler, SegmentPolicy};
pub use error::{CompileError, PathError};
pub use heading::{Heading, TurnDirection, REVERSAL_TURN};
pub use path::{Path, Waypoint};
pub use plan::{plan_drive, DrivePlan, DriveStep, MotorCommand};
pub use profile::DriveProfile;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
