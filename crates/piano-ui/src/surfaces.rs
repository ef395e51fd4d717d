//! Memory surfaces created by the widget catalog.

use piano_core::{Connection, Signal, Surface};
use piano_ui_graphics::{Point, Size};

/// Advance of one glyph in offset units.
pub const GLYPH_WIDTH: f32 = 8.0;
/// Height of one line of text.
pub const LINE_HEIGHT: f32 = 16.0;

/// Size of `text` rendered with the fixed glyph metrics.
pub fn measure_text(text: &str) -> Size {
    let mut lines = 0usize;
    let mut widest = 0usize;
    for line in text.split('\n') {
        lines += 1;
        widest = widest.max(line.chars().count());
    }
    Size::new(widest as f32 * GLYPH_WIDTH, lines as f32 * LINE_HEIGHT)
}

/// A text surface that grows to fit its text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub name: String,
    text: String,
    size: Size,
    position: Point,
    auto_size: bool,
}

impl TextLabel {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: String::new(),
            size: measure_text(&text),
            text,
            position: Point::ZERO,
            auto_size: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if self.auto_size {
            self.size = measure_text(&self.text);
        }
    }

    pub fn auto_size(&self) -> bool {
        self.auto_size
    }

    pub fn set_auto_size(&mut self, auto_size: bool) {
        self.auto_size = auto_size;
        if auto_size {
            self.size = measure_text(&self.text);
        }
    }
}

impl Surface for TextLabel {
    fn class_name(&self) -> &'static str {
        "TextLabel"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        if self.auto_size {
            log::trace!("ignoring explicit size on auto-sized label {:?}", self.text);
            return;
        }
        self.size = size;
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }
}

/// A clickable surface with a text caption.
#[derive(Default)]
pub struct TextButtonSurface {
    pub name: String,
    pub text: String,
    size: Size,
    position: Point,
    activated: Signal<()>,
}

impl TextButtonSurface {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn on_activated(&self, handler: impl Fn() + 'static) -> Connection {
        self.activated.connect(move |_| handler())
    }

    /// Simulates a host click.
    pub fn activate(&self) {
        self.activated.fire(&());
    }

    pub fn handler_count(&self) -> usize {
        self.activated.handler_count()
    }
}

impl std::fmt::Debug for TextButtonSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextButtonSurface")
            .field("text", &self.text)
            .field("size", &self.size)
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl Surface for TextButtonSurface {
    fn class_name(&self) -> &'static str {
        "TextButton"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }
}
