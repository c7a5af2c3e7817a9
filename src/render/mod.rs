//! Drawing primitives shared by every drawable: render states, quad batches
//! turned into macroquad meshes, and the `Drawable` capability consumed by
//! scenes and cameras.

/// Cameras.
pub mod camera;
/// Scenes and their layers.
pub mod scene;
/// Filled and outlined shapes.
pub mod shape;
/// Textured or colored rectangles.
pub mod sprite;

use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;

pub use camera::Camera;
pub use scene::{Layer, Scene, SharedDrawable};
pub use shape::{Shape, ShapeKind};
pub use sprite::Sprite;

/// macroquad meshes index with `u16`.
pub const MAX_QUADS_PER_MESH: usize = (u16::MAX as usize + 1) / 4 - 1;

/// Transform, tint and visible area a drawable is rendered with.
#[derive(Debug, Clone, Copy)]
pub struct RenderStates {
    /// Local-to-world transform.
    pub transform: Affine2,
    /// Color multiplied into everything drawn.
    pub tint: Color,
    /// Visible world rectangle, used for culling when set.
    pub view: Option<Rect>,
}

impl Default for RenderStates {
    fn default() -> Self {
        RenderStates {
            transform: Affine2::IDENTITY,
            tint: WHITE,
            view: None,
        }
    }
}

impl RenderStates {
    /// States for a child space that `m` maps into the current one.
    pub fn transformed(&self, m: Affine2) -> Self {
        RenderStates {
            transform: self.transform * m,
            ..*self
        }
    }

    /// States moved by `offset` in local space.
    pub fn translated(&self, offset: Vec2) -> Self {
        self.transformed(Affine2::from_translation(offset))
    }

    /// States with the tint alpha scaled by `opacity`.
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let mut tint = self.tint;
        tint.a *= opacity.clamp(0.0, 1.0);
        RenderStates { tint, ..*self }
    }

    /// The view rectangle expressed in the current local coordinates.
    pub fn local_view(&self) -> Option<Rect> {
        self.view
            .map(|v| transform_rect(&self.transform.inverse(), v))
    }
}

/// Anything a scene layer can hold.
pub trait Drawable {
    /// Position in the parent's coordinates.
    fn position(&self) -> Vec2;
    /// Bounds in the parent's coordinates.
    fn global_bounds(&self) -> Rect;
    /// Draws with `states`.
    fn draw(&self, states: &RenderStates);
}

/// Axis-aligned bounds of `r` after `m`.
pub fn transform_rect(m: &Affine2, r: Rect) -> Rect {
    let corners = [
        m.transform_point2(vec2(r.x, r.y)),
        m.transform_point2(vec2(r.x + r.w, r.y)),
        m.transform_point2(vec2(r.x + r.w, r.y + r.h)),
        m.transform_point2(vec2(r.x, r.y + r.h)),
    ];
    bounds_of(&corners).unwrap_or(Rect::new(corners[0].x, corners[0].y, 0.0, 0.0))
}

/// Smallest rectangle containing every point.
pub fn bounds_of(points: &[Vec2]) -> Option<Rect> {
    let first = *points.first()?;
    let (min, max) = points
        .iter()
        .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
}

/// Smallest rectangle containing both.
pub fn union_rect(a: Rect, b: Rect) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    let right = (a.x + a.w).max(b.x + b.w);
    let bottom = (a.y + a.h).max(b.y + b.h);
    Rect::new(x, y, right - x, bottom - y)
}

/// A textured quad: corners TL, TR, BR, BL in local pixels, texture
/// coordinates in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Corner positions.
    pub positions: [Vec2; 4],
    /// Texture coordinates of the same corners.
    pub tex_coords: [Vec2; 4],
}

impl Quad {
    /// Quad covering `rect`.
    pub fn new(rect: Rect, tex_coords: [Vec2; 4]) -> Self {
        Quad {
            positions: [
                vec2(rect.x, rect.y),
                vec2(rect.x + rect.w, rect.y),
                vec2(rect.x + rect.w, rect.y + rect.h),
                vec2(rect.x, rect.y + rect.h),
            ],
            tex_coords,
        }
    }

    /// Axis-aligned bounds of the corners.
    pub fn bounds(&self) -> Rect {
        bounds_of(&self.positions).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }
}

/// Submits quads as as few meshes as the index width allows.
pub fn draw_quads<'a>(
    quads: impl IntoIterator<Item = &'a Quad>,
    texture: Option<&Texture2D>,
    states: &RenderStates,
) {
    let uv_scale = texture
        .map(|t| vec2(1.0 / t.width().max(1.0), 1.0 / t.height().max(1.0)))
        .unwrap_or(Vec2::ZERO);

    let mut mesh = new_mesh(texture);
    for quad in quads {
        if mesh.vertices.len() / 4 >= MAX_QUADS_PER_MESH {
            draw_mesh(&mesh);
            mesh = new_mesh(texture);
        }
        let base = mesh.vertices.len() as u16;
        for (p, uv) in quad.positions.iter().zip(quad.tex_coords.iter()) {
            let p = states.transform.transform_point2(*p);
            let uv = *uv * uv_scale;
            mesh.vertices
                .push(Vertex::new(p.x, p.y, 0.0, uv.x, uv.y, states.tint));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    if !mesh.vertices.is_empty() {
        draw_mesh(&mesh);
    }
}

fn new_mesh(texture: Option<&Texture2D>) -> Mesh {
    Mesh {
        vertices: Vec::new(),
        indices: Vec::new(),
        texture: texture.cloned(),
    }
}

/// Fills a convex polygon given in local coordinates.
pub fn fill_convex(points: &[Vec2], color: Color, states: &RenderStates) {
    if points.len() < 3 || points.len() > u16::MAX as usize {
        return;
    }
    let color = tinted(color, states.tint);
    let vertices = points
        .iter()
        .map(|p| {
            let p = states.transform.transform_point2(*p);
            Vertex::new(p.x, p.y, 0.0, 0.0, 0.0, color)
        })
        .collect();
    let indices = (1..points.len() as u16 - 1)
        .flat_map(|i| [0, i, i + 1])
        .collect();
    draw_mesh(&Mesh {
        vertices,
        indices,
        texture: None,
    });
}

/// Strokes a polyline given in local coordinates.
pub fn stroke(points: &[Vec2], closed: bool, thickness: f32, color: Color, states: &RenderStates) {
    let color = tinted(color, states.tint);
    let world: Vec<Vec2> = points
        .iter()
        .map(|p| states.transform.transform_point2(*p))
        .collect();
    for pair in world.windows(2) {
        draw_line(pair[0].x, pair[0].y, pair[1].x, pair[1].y, thickness, color);
    }
    if closed && world.len() > 2 {
        let (a, b) = (world[world.len() - 1], world[0]);
        draw_line(a.x, a.y, b.x, b.y, thickness, color);
    }
}

/// Component-wise product of two colors.
pub fn tinted(c: Color, tint: Color) -> Color {
    Color::new(c.r * tint.r, c.g * tint.g, c.b * tint.b, c.a * tint.a)
}

/// `n` points on the ellipse inscribed in `rect`.
pub fn ellipse_points(rect: Rect, n: usize) -> Vec<Vec2> {
    let center = vec2(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
    let radii = vec2(rect.w / 2.0, rect.h / 2.0);
    (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            center + vec2(a.cos(), a.sin()) * radii
        })
        .collect()
}
