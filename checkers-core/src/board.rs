//! Square board geometry with diagonal directions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Board side length
pub const SIZE: i8 = 6;

/// Parity of `x + y` that marks a playable (dark) square
pub const TILING_PARITY: i8 = 0;

/// Number of playable squares (half the board)
pub const PLAYABLE_SQUARES: usize = (SIZE as usize * SIZE as usize) / 2;

/// Sign of an integer: -1, 0 or 1
pub fn sign(x: i8) -> i8 {
    x.signum()
}

/// Board coordinates, `x` is the column and `y` the row (row 0 at the top)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
}

impl Coord {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Check if this coordinate lies on the board
    pub fn is_valid(&self) -> bool {
        (0..SIZE).contains(&self.x) && (0..SIZE).contains(&self.y)
    }

    /// Check if this coordinate is on the board and on a playable square
    pub fn is_playable(&self) -> bool {
        self.is_valid() && (self.x + self.y).rem_euclid(2) == TILING_PARITY
    }

    /// Component-wise sign, turns a diagonal delta into a unit direction
    pub fn signum(&self) -> Coord {
        Coord::new(sign(self.x), sign(self.y))
    }

    /// Whether the delta `self` is a non-zero diagonal (`|dx| == |dy|`)
    pub fn is_diagonal(&self) -> bool {
        self.x != 0 && self.x.abs() == self.y.abs()
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, other: Coord) -> Coord {
        Coord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, other: Coord) -> Coord {
        Coord::new(self.x - other.x, self.y - other.y)
    }
}

impl From<(i8, i8)> for Coord {
    fn from((x, y): (i8, i8)) -> Self {
        Coord::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Diagonal unit directions.
/// Index: 0=up-left, 1=up-right, 2=down-right, 3=down-left
pub const DIRECTIONS: [Coord; 4] = [
    Coord::new(-1, -1),
    Coord::new(1, -1),
    Coord::new(1, 1),
    Coord::new(-1, 1),
];

/// Forward directions of a simple piece: the positive player moves up
/// (towards row 0), the negative player moves down.
pub fn forward_directions(sign: i8) -> &'static [Coord] {
    if sign > 0 {
        &DIRECTIONS[..2]
    } else {
        &DIRECTIONS[2..]
    }
}

/// Playable squares in canonical order (row-major). This order is shared by
/// move enumeration and the serialization codec.
pub fn playable_squares() -> impl Iterator<Item = Coord> {
    (0..SIZE).flat_map(|y| {
        (0..SIZE)
            .map(move |x| Coord::new(x, y))
            .filter(|c| c.is_playable())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_validity() {
        assert!(Coord::new(0, 0).is_valid());
        assert!(Coord::new(5, 5).is_valid());
        assert!(!Coord::new(6, 0).is_valid());
        assert!(!Coord::new(0, -1).is_valid());
        assert!(Coord::new(1, 1).is_playable());
        assert!(!Coord::new(1, 0).is_playable());
    }

    #[test]
    fn test_arithmetic_and_sign() {
        let a = Coord::new(4, 1);
        let b = Coord::new(1, 4);
        assert_eq!(a - b, Coord::new(3, -3));
        assert_eq!((a - b).signum(), Coord::new(1, -1));
        assert_eq!(b + Coord::new(1, -1), Coord::new(2, 3));
        assert_eq!(sign(-7), -1);
        assert_eq!(sign(0), 0);
    }

    #[test]
    fn test_diagonal() {
        assert!(Coord::new(2, -2).is_diagonal());
        assert!(!Coord::new(2, 1).is_diagonal());
        assert!(!Coord::new(0, 0).is_diagonal());
    }

    #[test]
    fn test_playable_squares() {
        let squares: Vec<_> = playable_squares().collect();
        assert_eq!(squares.len(), PLAYABLE_SQUARES);
        assert_eq!(squares[0], Coord::new(0, 0));
        assert_eq!(squares[3], Coord::new(1, 1));
        assert!(squares.iter().all(|c| c.is_playable()));
    }

    #[test]
    fn test_forward_directions() {
        assert!(forward_directions(1).iter().all(|d| d.y == -1));
        assert!(forward_directions(-1).iter().all(|d| d.y == 1));
    }
}
