//! The widget catalog.

pub mod align;
pub mod builder;
pub mod button;
pub mod flex;
pub mod frame;
pub mod padding;
pub mod surface_widget;
pub mod text;

pub use align::*;
pub use builder::*;
pub use button::*;
pub use flex::*;
pub use frame::*;
pub use padding::*;
pub use surface_widget::*;
pub use text::*;
