//! Layout contracts & policies for Piano

mod alignment;
mod axis;
mod constraints;

pub use alignment::*;
pub use axis::*;
pub use constraints::*;

pub mod prelude {
    pub use crate::alignment::Alignment;
    pub use crate::axis::Axis;
    pub use crate::constraints::BoxConstraints;
}

#[cfg(test)]
#[path = "tests/constraints_tests.rs"]
mod tests;
