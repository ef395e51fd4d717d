use std::rc::Rc;

use piano_core::prelude::*;

use super::frame::expand_to_constraints;

type SurfaceFactory = Rc<dyn Fn() -> Box<dyn Surface>>;

/// Places a caller-built surface directly in the tree.
///
/// The factory runs each time an element is created for this widget. With
/// `fill` set the surface grows to its constraints; otherwise its size is
/// left to the caller.
#[derive(Clone)]
pub struct SurfaceWidget {
    factory: SurfaceFactory,
    pub fill: bool,
}

impl SurfaceWidget {
    pub fn new(factory: impl Fn() -> Box<dyn Surface> + 'static) -> Self {
        Self {
            factory: Rc::new(factory),
            fill: false,
        }
    }

    pub fn filling(mut self) -> Self {
        self.fill = true;
        self
    }
}

impl FoundationWidget for SurfaceWidget {
    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        (self.factory)()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        true
    }

    fn size(&self, surface: &dyn Surface) -> Size {
        surface.size()
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        if self.fill {
            expand_to_constraints(cx, constraints, true, true)?;
        }
        Ok(())
    }
}

impl From<SurfaceWidget> for Widget {
    fn from(widget: SurfaceWidget) -> Self {
        Widget::foundation(widget)
    }
}
