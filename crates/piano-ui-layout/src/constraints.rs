//! Box constraints passed down the host-backed element tree.

use piano_ui_graphics::{EdgeInsets, Size};

use crate::Axis;

/// Minimum and maximum widths and heights. An absent maximum is
/// `f32::INFINITY`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxConstraints {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl Default for BoxConstraints {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl BoxConstraints {
    pub fn new(min_width: f32, max_width: f32, min_height: f32, max_height: f32) -> Self {
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Creates constraints with exact width and height.
    pub fn tight(width: f32, height: f32) -> Self {
        Self::new(width, width, height, height)
    }

    /// Creates constraints with loose bounds (min = 0, max = given values).
    pub fn loose(max_width: f32, max_height: f32) -> Self {
        Self::new(0.0, max_width, 0.0, max_height)
    }

    pub fn unbounded() -> Self {
        Self::new(0.0, f32::INFINITY, 0.0, f32::INFINITY)
    }

    /// Loose constraints bounded by `size`.
    pub fn from_size(size: Size) -> Self {
        Self::loose(size.width, size.height)
    }

    /// Returns true if these constraints have a single size that satisfies them.
    pub fn is_tight(&self) -> bool {
        self.min_width == self.max_width && self.min_height == self.max_height
    }

    /// Returns true if all maxima are finite.
    pub fn is_bounded(&self) -> bool {
        self.max_width.is_finite() && self.max_height.is_finite()
    }

    pub fn has_bounded_width(&self) -> bool {
        self.max_width.is_finite()
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height.is_finite()
    }

    /// Returns true if `size` lies within all four bounds.
    pub fn check(&self, size: Size) -> bool {
        size.width >= self.min_width
            && size.width <= self.max_width
            && size.height >= self.min_height
            && size.height <= self.max_height
    }

    /// Clamps `size` so that it does not exceed the maxima. Minima are not
    /// enforced; widgets decide for themselves whether to grow.
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(size.width.min(self.max_width), size.height.min(self.max_height))
    }

    /// Shrinks the maxima by `insets`, producing loose constraints for padded
    /// content. A maximum that would go negative is clamped to zero.
    pub fn deflate(&self, insets: EdgeInsets) -> Self {
        let max_width = deflate_axis(self.max_width, insets.horizontal_sum(), "width");
        let max_height = deflate_axis(self.max_height, insets.vertical_sum(), "height");
        Self::loose(max_width, max_height)
    }

    /// Tight constraints of `length` along `axis`, keeping the cross axis.
    pub fn with_main_axis_length(&self, axis: Axis, length: f32) -> Self {
        match axis {
            Axis::Horizontal => Self::new(length, length, self.min_height, self.max_height),
            Axis::Vertical => Self::new(self.min_width, self.max_width, length, length),
        }
    }

    /// Maximum along `axis`.
    pub fn main_axis_max(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.max_width,
            Axis::Vertical => self.max_height,
        }
    }

    /// Drops the minima.
    pub fn loosen(&self) -> Self {
        Self::loose(self.max_width, self.max_height)
    }
}

impl std::fmt::Display for BoxConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}; {} - {}",
            self.min_width, self.max_width, self.min_height, self.max_height
        )
    }
}

fn deflate_axis(max: f32, inset: f32, axis: &str) -> f32 {
    if !max.is_finite() {
        return max;
    }
    let deflated = max - inset;
    if deflated < 0.0 {
        log::warn!("insets of {inset} exceed the available {axis} of {max}; clamping to 0");
        0.0
    } else {
        deflated
    }
}
