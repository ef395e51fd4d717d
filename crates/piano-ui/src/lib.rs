//! Widget catalog built on top of the Piano reconciliation core.
//!
//! Every widget here is a plain struct that converts into a
//! [`piano_core::Widget`]; host-backed ones create the memory surfaces in
//! [`surfaces`].

pub mod surfaces;
pub mod widgets;

pub use surfaces::{measure_text, TextButtonSurface, TextLabel, GLYPH_WIDTH, LINE_HEIGHT};
pub use widgets::*;

pub mod prelude {
    pub use crate::surfaces::{TextButtonSurface, TextLabel};
    pub use crate::widgets::{
        column, expanded, row, Align, BaseFrame, Builder, Center, Flex, FlexFit, Flexible,
        Padding, SurfaceWidget, Text, TextButton,
    };
    pub use piano_core::prelude::*;
}

#[cfg(test)]
#[path = "tests/widgets_tests.rs"]
mod widgets_tests;

#[cfg(test)]
#[path = "tests/flex_tests.rs"]
mod flex_tests;
