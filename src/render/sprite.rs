use crate::render::{draw_quads, tinted, Drawable, Quad, RenderStates};
use macroquad::prelude::*;
use std::fmt;

/// A textured (or plain colored) rectangle.
#[derive(Clone)]
pub struct Sprite {
    texture: Option<Texture2D>,
    /// Source rectangle in texture pixels, the whole texture when unset.
    pub source: Option<Rect>,
    /// Drawn size in local pixels.
    pub size: Vec2,
    /// Top-left corner in the parent's coordinates.
    pub position: Vec2,
    /// Tint, or fill color when untextured.
    pub color: Color,
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("textured", &self.texture.is_some())
            .field("source", &self.source)
            .field("size", &self.size)
            .field("position", &self.position)
            .finish()
    }
}

impl Sprite {
    /// An untextured sprite filled with `color`.
    pub fn colored(size: Vec2, color: Color) -> Self {
        Sprite {
            texture: None,
            source: None,
            size,
            position: Vec2::ZERO,
            color,
        }
    }

    /// Sized after `source`, or after the texture when `source` is `None`.
    pub fn new(texture: Texture2D, source: Option<Rect>) -> Self {
        let size = source.map_or_else(|| texture.size(), |r| r.size());
        Sprite {
            texture: Some(texture),
            source,
            size,
            position: Vec2::ZERO,
            color: WHITE,
        }
    }

    /// The texture, if any.
    pub fn texture(&self) -> Option<&Texture2D> {
        self.texture.as_ref()
    }

    /// Replaces or removes the texture; `source` is kept.
    pub fn set_texture(&mut self, texture: Option<Texture2D>) {
        self.texture = texture;
    }

    fn tex_coords(&self) -> [Vec2; 4] {
        let r = match (self.source, &self.texture) {
            (Some(r), _) => r,
            (None, Some(t)) => Rect::new(0.0, 0.0, t.width(), t.height()),
            (None, None) => Rect::new(0.0, 0.0, 0.0, 0.0),
        };
        [
            vec2(r.x, r.y),
            vec2(r.x + r.w, r.y),
            vec2(r.x + r.w, r.y + r.h),
            vec2(r.x, r.y + r.h),
        ]
    }
}

impl Drawable for Sprite {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn global_bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }

    fn draw(&self, states: &RenderStates) {
        let quad = Quad::new(self.global_bounds(), self.tex_coords());
        let states = RenderStates {
            tint: tinted(self.color, states.tint),
            ..*states
        };
        draw_quads(std::iter::once(&quad), self.texture.as_ref(), &states);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colored_sprite_bounds() {
        let mut s = Sprite::colored(vec2(16.0, 8.0), GREEN);
        s.position = vec2(4.0, 4.0);
        assert_eq!(s.global_bounds(), Rect::new(4.0, 4.0, 16.0, 8.0));
        assert!(s.texture().is_none());
        assert_eq!(s.tex_coords()[2], Vec2::ZERO);
    }

    #[test]
    fn source_rect_drives_tex_coords() {
        let mut s = Sprite::colored(vec2(8.0, 8.0), WHITE);
        s.source = Some(Rect::new(8.0, 16.0, 8.0, 8.0));
        assert_eq!(s.tex_coords()[0], vec2(8.0, 16.0));
        assert_eq!(s.tex_coords()[2], vec2(16.0, 24.0));
    }
}
