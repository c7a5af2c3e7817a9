//! On-screen readouts for live values.

use crate::render::{tinted, Drawable, RenderStates};
use macroquad::prelude::*;
use std::fmt::{self, Display};

/// A `label value` line whose value is read every time it is drawn.
pub struct DebugText {
    label: String,
    value: Box<dyn Fn() -> String>,
    /// Top-left corner in screen space.
    pub position: Vec2,
    /// Text color before the render tint.
    pub color: Color,
    /// Size passed to macroquad's default font.
    pub font_size: u16,
}

impl fmt::Debug for DebugText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugText")
            .field("label", &self.label)
            .field("position", &self.position)
            .finish()
    }
}

impl DebugText {
    /// Creates a readout that calls `value` on every draw.
    pub fn new<T, F>(label: impl Into<String>, value: F) -> Self
    where
        T: Display,
        F: Fn() -> T + 'static,
    {
        DebugText {
            label: label.into(),
            value: Box::new(move || value().to_string()),
            position: Vec2::ZERO,
            color: WHITE,
            font_size: 20,
        }
    }

    /// Places the readout at `position`.
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// The fixed label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The line as it would be drawn now.
    pub fn text(&self) -> String {
        format!("{} {}", self.label, (self.value)())
    }
}

impl Drawable for DebugText {
    fn position(&self) -> Vec2 {
        self.position
    }

    /// Measures with macroquad's default font, so it needs a window.
    fn global_bounds(&self) -> Rect {
        let size = measure_text(&self.text(), None, self.font_size, 1.0);
        Rect::new(self.position.x, self.position.y, size.width, size.height)
    }

    fn draw(&self, states: &RenderStates) {
        let text = self.text();
        let size = measure_text(&text, None, self.font_size, 1.0);
        // draw_text places the baseline at y
        let origin = states
            .transform
            .transform_point2(self.position + vec2(0.0, size.offset_y));
        draw_text(
            &text,
            origin.x,
            origin.y,
            self.font_size as f32,
            tinted(self.color, states.tint),
        );
    }
}
