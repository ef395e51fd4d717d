//! Alignment utilities for positioning content

use piano_ui_graphics::{Point, Size};

/// A point within a box, where `-1.0` is the start edge, `0.0` the center and
/// `1.0` the end edge on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Alignment {
    pub x: f32,
    pub y: f32,
}

impl Alignment {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const TOP_LEFT: Self = Self::new(-1.0, -1.0);
    pub const TOP_CENTER: Self = Self::new(0.0, -1.0);
    pub const TOP_RIGHT: Self = Self::new(1.0, -1.0);
    pub const CENTER_LEFT: Self = Self::new(-1.0, 0.0);
    pub const CENTER: Self = Self::new(0.0, 0.0);
    pub const CENTER_RIGHT: Self = Self::new(1.0, 0.0);
    pub const BOTTOM_LEFT: Self = Self::new(-1.0, 1.0);
    pub const BOTTOM_CENTER: Self = Self::new(0.0, 1.0);
    pub const BOTTOM_RIGHT: Self = Self::new(1.0, 1.0);

    /// Returns the top-left position of a `child` box aligned inside `container`.
    ///
    /// Children larger than the container are pinned to the start edge.
    pub fn align(&self, child: Size, container: Size) -> Point {
        let free_x = (container.width - child.width).max(0.0);
        let free_y = (container.height - child.height).max(0.0);
        Point::new(free_x * (self.x + 1.0) / 2.0, free_y * (self.y + 1.0) / 2.0)
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::CENTER
    }
}
