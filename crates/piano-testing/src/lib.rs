//! Testing utilities and harness for Piano

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
