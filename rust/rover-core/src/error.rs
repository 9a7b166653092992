use thiserror::Error;

use crate::path::Waypoint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid argument: path must contain at least one waypoint")]
    EmptyPath,
    #[error("invalid path segment at index {index}: {from} -> {to} is not a unit orthogonal step")]
    InvalidPathSegment { index: usize, from: Waypoint, to: Waypoint },
}

/// Reasons an append to a [`crate::Path`] is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("{0} is not adjacent to the last waypoint {1}")]
    NotAdjacent(Waypoint, Waypoint),
    #[error("{0} is already on the path")]
    AlreadyVisited(Waypoint),
    #[error("{waypoint} is outside the {size}x{size} planner grid")]
    OutOfBounds { waypoint: Waypoint, size: i32 },
    #[error("an empty path must start at the origin, got {0}")]
    MustStartAtOrigin(Waypoint),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line is not a detection record: {line}")]
pub struct DetectionParseError {
    pub line: String,
}
