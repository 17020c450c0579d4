//! Chain-based constraint layout.
//!
//! A layout pass builds a tree of chains in a per-pass arena, recalculates
//! min/max bottom-up, then distributes positions and sizes top-down. The
//! tree is discarded and rebuilt on every fit; nothing survives between
//! passes.

pub mod chain;
pub mod packer;
pub mod strip;

pub use chain::{Chain, ChainArena, ChainId, LayoutTable};
pub use packer::fit;
pub use strip::Strip;

use crate::primitives::Size;

/// Direction a chain lays its children out in.
///
/// `Up` and `LeftToRight` are the canonical (unmirrored) directions for a
/// bottom-left-origin coordinate space; `Down` and `RightToLeft` mirror
/// child positions so the chain still reads in the expected visual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    Up,
    Down,
}

impl Direction {
    /// The axis this direction runs along, ignoring sign.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Direction::LeftToRight | Direction::RightToLeft => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// Whether child positions must be mirrored within the distributed span.
    #[inline]
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::RightToLeft | Direction::Down)
    }

    /// A canonical direction along the perpendicular axis.
    #[inline]
    pub fn cross(self) -> Direction {
        match self.axis() {
            Axis::Horizontal => Direction::Up,
            Axis::Vertical => Direction::LeftToRight,
        }
    }
}

/// One of the two layout axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Component of a size along this axis.
    #[inline]
    pub fn pick(self, size: Size) -> f32 {
        match self {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_axis() {
        assert_eq!(Direction::LeftToRight.axis(), Axis::Horizontal);
        assert_eq!(Direction::RightToLeft.axis(), Axis::Horizontal);
        assert_eq!(Direction::Up.axis(), Axis::Vertical);
        assert_eq!(Direction::Down.axis(), Axis::Vertical);
    }

    #[test]
    fn reversed_directions() {
        assert!(!Direction::LeftToRight.is_reversed());
        assert!(Direction::RightToLeft.is_reversed());
        assert!(!Direction::Up.is_reversed());
        assert!(Direction::Down.is_reversed());
    }

    #[test]
    fn cross_flips_axis() {
        assert_eq!(Direction::LeftToRight.cross(), Direction::Up);
        assert_eq!(Direction::Down.cross(), Direction::LeftToRight);
    }

    #[test]
    fn axis_pick() {
        let size = Size::new(3.0, 5.0);
        assert_eq!(Axis::Horizontal.pick(size), 3.0);
        assert_eq!(Axis::Vertical.pick(size), 5.0);
    }
}
