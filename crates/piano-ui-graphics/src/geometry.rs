//! Geometric primitives: Point, Size, EdgeInsets

use std::ops::{Add, Sub};

/// An offset position relative to the parent surface.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    /// Applies `f` to both dimensions.
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.width), f(self.height))
    }

    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// Padding values for each edge of a rectangle.
///
/// `start` and `end` are the left and right edges in a left-to-right context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeInsets {
    pub start: f32,
    pub end: f32,
    pub top: f32,
    pub bottom: f32,
}

impl EdgeInsets {
    pub const ZERO: EdgeInsets = EdgeInsets {
        start: 0.0,
        end: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    pub fn new(start: f32, end: f32, top: f32, bottom: f32) -> Self {
        Self {
            start,
            end,
            top,
            bottom,
        }
    }

    pub fn all(inset: f32) -> Self {
        Self::new(inset, inset, inset, inset)
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, horizontal, vertical, vertical)
    }

    pub fn horizontal_sum(&self) -> f32 {
        self.start + self.end
    }

    pub fn vertical_sum(&self) -> f32 {
        self.top + self.bottom
    }

    /// Top-left offset of content placed inside these insets.
    pub fn origin(&self) -> Point {
        Point::new(self.start, self.top)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}
