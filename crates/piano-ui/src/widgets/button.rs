//! Button widget implementation

use std::rc::Rc;

use piano_core::prelude::*;

use super::frame::expand_to_constraints;
use crate::surfaces::TextButtonSurface;

/// Key of the activation connection kept on the button's element.
pub const ON_CLICK: &str = "on_click";

/// A captioned button that calls `on_click` when the host activates it.
#[derive(Clone)]
pub struct TextButton {
    pub text: String,
    pub on_click: Rc<dyn Fn()>,
}

impl TextButton {
    pub fn new(text: impl Into<String>, on_click: impl Fn() + 'static) -> Self {
        Self {
            text: text.into(),
            on_click: Rc::new(on_click),
        }
    }

    fn connect(&self, cx: &mut SurfaceContext<'_>, surface: &TextButtonSurface) {
        let on_click = self.on_click.clone();
        cx.connect(ON_CLICK, surface.on_activated(move || on_click()));
    }
}

impl FoundationWidget for TextButton {
    fn create_surface(&self, cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        let surface = TextButtonSurface::new(self.text.clone());
        self.connect(cx, &surface);
        Box::new(surface)
    }

    fn update_surface(
        &self,
        cx: &mut SurfaceContext<'_>,
        surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        let Some(button) = surface.downcast_mut::<TextButtonSurface>() else {
            return false;
        };
        button.text.clone_from(&self.text);
        self.connect(cx, button);
        true
    }

    fn size(&self, surface: &dyn Surface) -> Size {
        surface.size()
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        expand_to_constraints(cx, constraints, true, true)?;
        Ok(())
    }
}

impl From<TextButton> for Widget {
    fn from(button: TextButton) -> Self {
        Widget::foundation(button)
    }
}
