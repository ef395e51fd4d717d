//! Plain frame widget and the sizing helper most host-backed widgets share.

use piano_core::prelude::*;
use piano_core::Frame;

/// Grows the element's surface to the bounded maxima of `constraints`.
///
/// An unbounded axis, or one not selected by `width`/`height`, keeps the
/// surface's current extent.
pub fn expand_to_constraints(
    cx: &mut LayoutContext<'_>,
    constraints: BoxConstraints,
    width: bool,
    height: bool,
) -> PianoResult<Size> {
    let current = cx.with_surface(|surface| surface.size())?;
    let mut size = current;
    if width && constraints.has_bounded_width() {
        size.width = constraints.max_width;
    }
    if height && constraints.has_bounded_height() {
        size.height = constraints.max_height;
    }
    cx.set_size(size)?;
    Ok(size)
}

pub(crate) fn frame_surface() -> Box<dyn Surface> {
    Box::new(Frame::new(Size::new(1.0, 1.0)))
}

/// A frame that fills its constraints and leaves its children where they are.
pub struct BaseFrame {
    pub children: Vec<Widget>,
}

impl BaseFrame {
    pub fn new(children: Vec<Widget>) -> Self {
        Self { children }
    }
}

impl FoundationWidget for BaseFrame {
    fn children(&self) -> Option<Vec<Widget>> {
        Some(self.children.clone())
    }

    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        frame_surface()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        surface.downcast_ref::<Frame>().is_some()
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        expand_to_constraints(cx, constraints, true, true)?;
        Ok(())
    }
}

impl From<BaseFrame> for Widget {
    fn from(frame: BaseFrame) -> Self {
        Widget::foundation(frame)
    }
}
