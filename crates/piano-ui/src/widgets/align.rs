//! Widgets that position a single child inside themselves.

use piano_core::prelude::*;
use piano_core::ElementId;

use super::frame::frame_surface;

fn only_child(cx: &LayoutContext<'_>, widget: &'static str) -> PianoResult<ElementId> {
    cx.children()?
        .first()
        .copied()
        .ok_or(PianoError::NoChildComponent { widget })
}

/// Own extent along one axis: the bounded maximum, the child's extent when
/// unbounded, or the child's extent times `factor` when one is given.
fn extent(factor: Option<f32>, max: f32, child: f32) -> f32 {
    match factor {
        Some(factor) => child * factor,
        None if max.is_finite() => max,
        None => child,
    }
}

/// Centers its child within itself.
///
/// Without size factors the widget is as big as its constraints allow and
/// matches its child on unbounded axes. A factor makes that dimension the
/// child's extent times the factor.
pub struct Center {
    pub width_factor: Option<f32>,
    pub height_factor: Option<f32>,
    pub child: Widget,
}

impl Center {
    pub fn new(child: impl Into<Widget>) -> Self {
        Self {
            width_factor: None,
            height_factor: None,
            child: child.into(),
        }
    }

    pub fn with_width_factor(mut self, factor: f32) -> Self {
        self.width_factor = Some(factor);
        self
    }

    pub fn with_height_factor(mut self, factor: f32) -> Self {
        self.height_factor = Some(factor);
        self
    }
}

impl FoundationWidget for Center {
    fn children(&self) -> Option<Vec<Widget>> {
        Some(vec![self.child.clone()])
    }

    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        frame_surface()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        true
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        let child = only_child(cx, "Center")?;
        cx.layout_child(child, constraints)?;
        let child_size = cx.child_size(child)?;
        let size = Size::new(
            extent(self.width_factor, constraints.max_width, child_size.width),
            extent(self.height_factor, constraints.max_height, child_size.height),
        );
        cx.set_size(size)?;
        cx.set_child_position(
            child,
            Point::new(
                size.width / 2.0 - child_size.width / 2.0,
                size.height / 2.0 - child_size.height / 2.0,
            ),
        )
    }
}

impl From<Center> for Widget {
    fn from(center: Center) -> Self {
        Widget::foundation(center)
    }
}

/// Places its child at `alignment` within the space its constraints allow.
pub struct Align {
    pub alignment: Alignment,
    pub child: Widget,
}

impl Align {
    pub fn new(alignment: Alignment, child: impl Into<Widget>) -> Self {
        Self {
            alignment,
            child: child.into(),
        }
    }
}

impl FoundationWidget for Align {
    fn children(&self) -> Option<Vec<Widget>> {
        Some(vec![self.child.clone()])
    }

    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        frame_surface()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        true
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        let child = only_child(cx, "Align")?;
        cx.layout_child(child, constraints.loosen())?;
        let child_size = cx.child_size(child)?;
        let size = Size::new(
            extent(None, constraints.max_width, child_size.width),
            extent(None, constraints.max_height, child_size.height),
        );
        cx.set_size(size)?;
        cx.set_child_position(child, self.alignment.align(child_size, size))
    }
}

impl From<Align> for Widget {
    fn from(align: Align) -> Self {
        Widget::foundation(align)
    }
}
