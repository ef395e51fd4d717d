#![doc = r"Reconciliation core for the Piano retained-mode UI framework."]

extern crate self as piano_core;

pub mod collections;
pub mod hash;
pub mod hook_primitives;
pub mod platform;
pub mod runtime;

mod context;
mod element;
mod hook;
mod provider;
mod root;
mod surface;
mod widget;

pub use context::{BuildContext, InfixChild, LayoutContext, StateContext, SurfaceContext};
pub use element::{ElementHandle, ElementId, ElementKind, ElementTree};
pub use hook::{keys_identical, Hook, HookState};
pub use hook_primitives::{
    use_callback, use_effect, use_memoized, use_ref, use_state, use_value_changed, EffectCleanup,
    ObjectRef, StateSetter,
};
pub use platform::FrameScheduler;
pub use provider::Aspect;
pub use root::{MountOptions, PianoRoot, TickStats};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use surface::{
    AsAny, Connection, Connections, Frame, MemoryHost, Signal, Surface, SurfaceError, SurfaceExt,
    SurfaceHost, SurfaceId,
};
pub use widget::{
    FoundationWidget, HookWidget, InheritedWidget, ProxyWidget, State, StatefulWidget,
    StatelessWidget, Widget, WidgetKind, WidgetVariant,
};

pub use piano_ui_graphics::{EdgeInsets, Point, Size};
pub use piano_ui_layout::{Alignment, Axis, BoxConstraints};

use std::fmt;

pub type Key = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PianoError {
    /// A subtree that needed a host surface ended without one.
    NoChildComponent { widget: &'static str },
    ProviderNotFound { provider: &'static str },
    HookOutsideBuild { widget: &'static str },
    MissingElement { id: ElementId },
    NotHostBacked { id: ElementId },
    WidgetMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The element's state or hook slots are already checked out by a build.
    Reentrant { id: ElementId },
    Surface(SurfaceError),
}

impl fmt::Display for PianoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PianoError::NoChildComponent { widget } => write!(f, "no child component at {widget}"),
            PianoError::ProviderNotFound { provider } => {
                write!(f, "no ancestor provides {provider}")
            }
            PianoError::HookOutsideBuild { widget } => {
                write!(f, "{widget} used a hook outside a hook widget build")
            }
            PianoError::MissingElement { id } => write!(f, "element {id} missing"),
            PianoError::NotHostBacked { id } => write!(f, "element {id} has no surface"),
            PianoError::WidgetMismatch { expected, found } => {
                write!(f, "widget mismatch; expected {expected}, found {found}")
            }
            PianoError::Reentrant { id } => write!(f, "element {id} is already building"),
            PianoError::Surface(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PianoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PianoError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SurfaceError> for PianoError {
    fn from(err: SurfaceError) -> Self {
        PianoError::Surface(err)
    }
}

pub type PianoResult<T> = Result<T, PianoError>;

pub mod prelude {
    pub use crate::hook_keys;
    pub use crate::{
        use_callback, use_effect, use_memoized, use_ref, use_state, use_value_changed,
        BuildContext, FoundationWidget, HookWidget, InheritedWidget, LayoutContext, PianoError,
        PianoResult, PianoRoot, ProxyWidget, State, StateContext, StatefulWidget,
        StatelessWidget, Surface, SurfaceContext, SurfaceExt, Widget,
    };
    pub use piano_ui_graphics::prelude::*;
    pub use piano_ui_layout::prelude::*;
}

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod element_tests;

#[cfg(test)]
#[path = "tests/hook_tests.rs"]
mod hook_tests;

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod provider_tests;

#[cfg(test)]
#[path = "tests/root_tests.rs"]
mod root_tests;

#[cfg(test)]
#[path = "tests/test_widgets.rs"]
mod test_widgets;
