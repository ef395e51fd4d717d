//! Text widget implementation

use piano_core::prelude::*;

use crate::surfaces::TextLabel;

/// A run of text that sizes itself from its content.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl FoundationWidget for Text {
    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        Box::new(TextLabel::new(self.text.clone()))
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        match surface.downcast_mut::<TextLabel>() {
            Some(label) => {
                if label.text() != self.text {
                    label.set_text(self.text.clone());
                }
                true
            }
            None => false,
        }
    }

    // auto-sized by the label itself
    fn layout(&self, _cx: &mut LayoutContext<'_>, _constraints: BoxConstraints) -> PianoResult<()> {
        Ok(())
    }
}

impl From<Text> for Widget {
    fn from(text: Text) -> Self {
        Widget::foundation(text)
    }
}
