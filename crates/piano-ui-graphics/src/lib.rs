//! Pure math/data for Piano's offset-based 2D geometry.
//!
//! This crate contains the value types shared by the layout contracts,
//! the reconciliation core and the widget catalog.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{EdgeInsets, Point, Size};
}
