//! Cardinal headings on a four-slot ring.
//!
//! Ring order is N=0, E=1, S=2, W=3; one step clockwise is +1. Grid y grows
//! downward, so a `+y` step faces South.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    North,
    East,
    South,
    West,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

/// Direction used for both halves of a 180 degree reversal.
pub const REVERSAL_TURN: TurnDirection = TurnDirection::Right;

/// Heading the rover faces before the first command of any path.
pub const INITIAL_HEADING: Heading = Heading::East;

const RING: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

impl Heading {
    #[inline]
    pub fn ring_index(self) -> u8 {
        match self {
            Heading::North => 0,
            Heading::East => 1,
            Heading::South => 2,
            Heading::West => 3,
        }
    }

    #[inline]
    pub fn from_ring_index(idx: u8) -> Self {
        RING[(idx % 4) as usize]
    }

    pub fn turned(self, dir: TurnDirection) -> Self {
        match dir {
            TurnDirection::Right => Self::from_ring_index(self.ring_index() + 1),
            TurnDirection::Left => Self::from_ring_index(self.ring_index() + 3),
        }
    }

    /// Heading for a unit orthogonal step, or None for diagonal/zero/long steps.
    pub fn from_step(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (1, 0) => Some(Heading::East),
            (-1, 0) => Some(Heading::West),
            (0, 1) => Some(Heading::South),
            (0, -1) => Some(Heading::North),
            _ => None,
        }
    }

    /// Clockwise distance on the ring, in quarter turns (0..=3).
    #[inline]
    pub fn clockwise_steps_to(self, target: Heading) -> u8 {
        (target.ring_index() + 4 - self.ring_index()) % 4
    }

    /// Turns needed to face `target`. A single quarter turn goes the short way;
    /// a reversal is two turns of [`REVERSAL_TURN`].
    pub fn turns_to(self, target: Heading) -> Vec<TurnDirection> {
        match self.clockwise_steps_to(target) {
            0 => Vec::new(),
            1 => vec![TurnDirection::Right],
            3 => vec![TurnDirection::Left],
            _ => vec![REVERSAL_TURN, REVERSAL_TURN],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turning_wraps_around_the_ring() {
        assert_eq!(Heading::West.turned(TurnDirection::Right), Heading::North);
        assert_eq!(Heading::North.turned(TurnDirection::Left), Heading::West);
        assert_eq!(Heading::East.turned(TurnDirection::Right), Heading::South);
    }

    #[test]
    fn step_mapping_uses_screen_axes() {
        assert_eq!(Heading::from_step(1, 0), Some(Heading::East));
        assert_eq!(Heading::from_step(0, 1), Some(Heading::South));
        assert_eq!(Heading::from_step(0, -1), Some(Heading::North));
        assert_eq!(Heading::from_step(1, 1), None);
        assert_eq!(Heading::from_step(0, 0), None);
        assert_eq!(Heading::from_step(2, 0), None);
    }

    #[test]
    fn reversal_is_two_rights_from_every_heading() {
        for h in RING {
            let back = h.turned(TurnDirection::Right).turned(TurnDirection::Right);
            assert_eq!(h.turns_to(back), vec![TurnDirection::Right, TurnDirection::Right]);
        }
    }

    #[test]
    fn quarter_turns_take_the_short_way() {
        assert_eq!(Heading::East.turns_to(Heading::North), vec![TurnDirection::Left]);
        assert_eq!(Heading::East.turns_to(Heading::South), vec![TurnDirection::Right]);
        assert!(Heading::East.turns_to(Heading::East).is_empty());
    }
}
