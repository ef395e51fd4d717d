use piano_core::prelude::*;

use super::frame::frame_surface;

/// Insets its child by fixed amounts on each side.
pub struct Padding {
    pub insets: EdgeInsets,
    pub child: Widget,
}

impl Padding {
    pub fn new(insets: EdgeInsets, child: impl Into<Widget>) -> Self {
        Self {
            insets,
            child: child.into(),
        }
    }
}

impl FoundationWidget for Padding {
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
        let children = cx.children()?;
        let Some(&child) = children.first() else {
            return Err(PianoError::NoChildComponent { widget: "Padding" });
        };
        cx.layout_child(child, constraints.deflate(self.insets))?;
        cx.set_child_position(child, self.insets.origin())?;
        let child_size = cx.child_size(child)?;
        let padded = Size::new(
            child_size.width + self.insets.horizontal_sum(),
            child_size.height + self.insets.vertical_sum(),
        );
        cx.set_size(constraints.constrain(padded))
    }
}

impl From<Padding> for Widget {
    fn from(padding: Padding) -> Self {
        Widget::foundation(padding)
    }
}
