use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::heading::Heading;

/// Grid cell visited by the rover. Serialized as `[x, y]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Waypoint {
    pub x: i32,
    pub y: i32,
}

pub const ORIGIN: Waypoint = Waypoint { x: 0, y: 0 };

impl Waypoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Widened so opposite corners of the `i32` plane do not overflow.
    #[inline]
    pub fn manhattan(self, other: Waypoint) -> i64 {
        (i64::from(self.x) - i64::from(other.x)).abs() + (i64::from(self.y) - i64::from(other.y)).abs()
    }

    /// Heading of a unit orthogonal step to `other`, if it is one.
    pub fn heading_to(self, other: Waypoint) -> Option<Heading> {
        let dx = other.x.checked_sub(self.x)?;
        let dy = other.y.checked_sub(self.y)?;
        Heading::from_step(dx, dy)
    }

    #[inline]
    pub fn is_adjacent(self, other: Waypoint) -> bool {
        self.manhattan(other) == 1
    }
}

impl From<[i32; 2]> for Waypoint {
    fn from(v: [i32; 2]) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Waypoint> for [i32; 2] {
    fn from(w: Waypoint) -> Self {
        [w.x, w.y]
    }
}

impl From<(i32, i32)> for Waypoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Planner path. Grows one adjacent, unvisited cell at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Default for Path {
    fn default() -> Self {
        Self::origin()
    }
}

impl Path {
    /// Single-element path at the origin.
    pub fn origin() -> Self {
        Self { waypoints: vec![ORIGIN] }
    }

    /// Wraps externally stored waypoints as-is. No adjacency checks are made;
    /// the compiler decides what to do with malformed steps.
    pub fn from_waypoints(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last(&self) -> Option<Waypoint> {
        self.waypoints.last().copied()
    }

    pub fn contains(&self, w: Waypoint) -> bool {
        self.waypoints.contains(&w)
    }

    pub fn index_of(&self, w: Waypoint) -> Option<usize> {
        self.waypoints.iter().position(|p| *p == w)
    }

    pub fn reset(&mut self) {
        self.waypoints.clear();
        self.waypoints.push(ORIGIN);
    }

    pub fn check_append(&self, w: Waypoint) -> Result<(), PathError> {
        let Some(last) = self.last() else {
            return if w == ORIGIN { Ok(()) } else { Err(PathError::MustStartAtOrigin(w)) };
        };
        if self.contains(w) {
            return Err(PathError::AlreadyVisited(w));
        }
        if !last.is_adjacent(w) {
            return Err(PathError::NotAdjacent(w, last));
        }
        Ok(())
    }

    pub fn can_append(&self, w: Waypoint) -> bool {
        self.check_append(w).is_ok()
    }

    pub fn append(&mut self, w: Waypoint) -> Result<(), PathError> {
        self.check_append(w)?;
        self.waypoints.push(w);
        Ok(())
    }

    /// Append restricted to cells `0..size` on both axes.
    pub fn append_within(&mut self, w: Waypoint, size: i32) -> Result<(), PathError> {
        if w.x < 0 || w.y < 0 || w.x >= size || w.y >= size {
            return Err(PathError::OutOfBounds { waypoint: w, size });
        }
        self.append(w)
    }

    /// True when the path satisfies the append invariant end to end.
    pub fn is_well_formed(&self) -> bool {
        let mut seen: FxHashSet<Waypoint> = FxHashSet::default();
        for (i, w) in self.waypoints.iter().enumerate() {
            if !seen.insert(*w) {
                return false;
            }
            if i > 0 && !self.waypoints[i - 1].is_adjacent(*w) {
                return false;
            }
        }
        true
    }
}

impl From<Vec<Waypoint>> for Path {
    fn from(v: Vec<Waypoint>) -> Self {
        Self::from_waypoints(v)
    }
}
