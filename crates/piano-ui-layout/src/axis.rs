//! Axis definitions for flex layouts.

use piano_ui_graphics::{Point, Size};

/// Identifies the primary direction for sizing and placing children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal main axis.
    Horizontal,
    /// Vertical main axis.
    Vertical,
}

impl Axis {
    /// Returns true if this axis is horizontal.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Axis::Horizontal)
    }

    /// Returns true if this axis is vertical.
    pub fn is_vertical(self) -> bool {
        matches!(self, Axis::Vertical)
    }

    /// Extent of `size` along this axis.
    pub fn main(self, size: Size) -> f32 {
        match self {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }

    /// Extent of `size` across this axis.
    pub fn cross(self, size: Size) -> f32 {
        match self {
            Axis::Horizontal => size.height,
            Axis::Vertical => size.width,
        }
    }

    /// Builds a point from main/cross axis offsets.
    pub fn point(self, main: f32, cross: f32) -> Point {
        match self {
            Axis::Horizontal => Point::new(main, cross),
            Axis::Vertical => Point::new(cross, main),
        }
    }
}
