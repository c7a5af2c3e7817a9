//! Text drawn from a fixed-size glyph sheet.

use crate::config::TextureSettings;
use crate::error::{EngineError, Result};
use crate::render::{draw_quads, tinted, Drawable, Quad, RenderStates};
use anyhow::Context;
use macroquad::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;

/// Printable ASCII, in sheet order.
pub const DEFAULT_CHARS: &str =
    " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Where one character sits on the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapGlyph {
    /// The character drawn.
    pub character: char,
    /// Source rectangle in sheet pixels.
    pub texture_rect: Rect,
    /// Horizontal distance to the next glyph.
    pub advance: f32,
}

/// Glyphs sliced row-major from a sheet, one per character of a char map.
pub struct BitmapFont {
    texture: Option<Texture2D>,
    glyph_size: Vec2,
    glyphs: HashMap<char, BitmapGlyph>,
}

impl BitmapFont {
    /// Lays out `chars` over a `sheet_size` image cut into `glyph_size` cells.
    /// `advances` overrides the advance of every char in each string; the
    /// rest advance by the glyph width. Cells past the end of `chars`, and
    /// chars past the last cell, are ignored.
    pub fn new(sheet_size: UVec2, glyph_size: UVec2, chars: &str, advances: &[(&str, u32)]) -> Self {
        let overrides: HashMap<char, u32> = advances
            .iter()
            .flat_map(|(group, advance)| group.chars().map(move |c| (c, *advance)))
            .collect();

        let mut glyphs = HashMap::new();
        if glyph_size.x > 0 && glyph_size.y > 0 {
            let columns = sheet_size.x / glyph_size.x;
            let rows = sheet_size.y / glyph_size.y;
            let cells = (0..rows).flat_map(|row| (0..columns).map(move |col| (col, row)));
            for (character, (col, row)) in chars.chars().zip(cells) {
                glyphs.insert(
                    character,
                    BitmapGlyph {
                        character,
                        texture_rect: Rect::new(
                            (col * glyph_size.x) as f32,
                            (row * glyph_size.y) as f32,
                            glyph_size.x as f32,
                            glyph_size.y as f32,
                        ),
                        advance: *overrides.get(&character).unwrap_or(&glyph_size.x) as f32,
                    },
                );
            }
        }

        BitmapFont {
            texture: None,
            glyph_size: glyph_size.as_vec2(),
            glyphs,
        }
    }

    /// Slices an already loaded sheet.
    pub fn from_texture(texture: Texture2D, glyph_size: UVec2, chars: &str, advances: &[(&str, u32)]) -> Self {
        let sheet = texture.size().as_uvec2();
        let mut font = Self::new(sheet, glyph_size, chars, advances);
        font.texture = Some(texture);
        font
    }

    /// Loads the sheet at `path` and slices it.
    pub async fn load(
        path: &str,
        glyph_size: UVec2,
        chars: &str,
        advances: &[(&str, u32)],
        settings: &TextureSettings,
    ) -> anyhow::Result<Self> {
        let texture = load_texture(path)
            .await
            .with_context(|| format!("Loading font sheet {}", path))?;
        texture.set_filter(settings.filter.into());
        Ok(Self::from_texture(texture, glyph_size, chars, advances))
    }

    /// The sheet, when the font was built from one.
    pub fn texture(&self) -> Option<&Texture2D> {
        self.texture.as_ref()
    }

    /// Size of one sheet cell.
    pub fn glyph_size(&self) -> Vec2 {
        self.glyph_size
    }

    /// The glyph for `character`.
    pub fn glyph(&self, character: char) -> Result<&BitmapGlyph> {
        self.glyphs
            .get(&character)
            .ok_or(EngineError::MissingGlyph(character))
    }

    /// Size of `string` laid out as [`BitmapText`] does.
    pub fn compute_string_size(&self, string: &str) -> Result<Vec2> {
        let mut widest = 0.0f32;
        let mut rows = 0;
        for line in string.split('\n') {
            let mut width = 0.0;
            for c in line.chars() {
                width += self.glyph(c)?.advance;
            }
            widest = widest.max(width);
            rows += 1;
        }
        Ok(vec2(widest, rows as f32 * self.glyph_size.y))
    }
}

/// A string laid out with a [`BitmapFont`].
pub struct BitmapText {
    string: String,
    font: Option<Rc<BitmapFont>>,
    color: Color,
    /// Top-left corner of the first line.
    pub position: Vec2,
    quads: Vec<Quad>,
    size: Vec2,
}

impl BitmapText {
    /// Text with no font yet; it draws nothing until one is set.
    pub fn new(string: impl Into<String>) -> Self {
        BitmapText {
            string: string.into(),
            font: None,
            color: WHITE,
            position: Vec2::ZERO,
            quads: Vec::new(),
            size: Vec2::ZERO,
        }
    }

    /// The laid out string.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Replaces the string and lays it out again.
    pub fn set_string(&mut self, string: impl Into<String>) -> Result<()> {
        self.string = string.into();
        self.refresh()
    }

    /// The font in use.
    pub fn font(&self) -> Option<&Rc<BitmapFont>> {
        self.font.as_ref()
    }

    /// Switches font and lays the string out again.
    pub fn set_font(&mut self, font: Rc<BitmapFont>) -> Result<()> {
        self.font = Some(font);
        self.refresh()
    }

    /// Glyph tint.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Sets the glyph tint.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Shifts the text by `offset`.
    pub fn move_by(&mut self, offset: Vec2) {
        self.position += offset;
    }

    /// Width of the widest line.
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Line count times glyph height.
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// `(width, height)`.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Glyph quads relative to `position`.
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Rebuilds the glyph quads. On a missing glyph the text is left empty.
    pub fn refresh(&mut self) -> Result<()> {
        self.quads.clear();
        self.size = Vec2::ZERO;
        let Some(font) = self.font.clone() else {
            return Ok(());
        };
        let glyph_size = font.glyph_size();
        let mut quads = Vec::with_capacity(self.string.len());
        let mut pen = Vec2::ZERO;
        let mut widest = 0.0f32;
        for c in self.string.chars() {
            if c == '\n' {
                widest = widest.max(pen.x);
                pen = vec2(0.0, pen.y + glyph_size.y);
                continue;
            }
            let glyph = font.glyph(c)?;
            let r = glyph.texture_rect;
            quads.push(Quad::new(
                Rect::new(pen.x, pen.y, glyph_size.x, glyph_size.y),
                [
                    vec2(r.x, r.y),
                    vec2(r.x + r.w, r.y),
                    vec2(r.x + r.w, r.y + r.h),
                    vec2(r.x, r.y + r.h),
                ],
            ));
            pen.x += glyph.advance;
        }
        self.quads = quads;
        self.size = vec2(widest.max(pen.x), pen.y + glyph_size.y);
        Ok(())
    }
}

impl Drawable for BitmapText {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn global_bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }

    fn draw(&self, states: &RenderStates) {
        let Some(texture) = self.font.as_ref().and_then(|f| f.texture()) else {
            return;
        };
        let states = RenderStates {
            tint: tinted(self.color, states.tint),
            ..states.translated(self.position)
        };
        draw_quads(&self.quads, Some(texture), &states);
    }
}
