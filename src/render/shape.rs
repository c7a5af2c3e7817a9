use crate::render::{bounds_of, ellipse_points, fill_convex, stroke, Drawable, RenderStates};
use macroquad::prelude::*;

/// Geometry of a [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    /// Grows right and down from the position.
    Rectangle(Vec2),
    /// Regular polygon centered on the position.
    Circle {
        /// Distance from the center to each vertex.
        radius: f32,
        /// Number of vertices.
        points: usize,
    },
}

/// A filled shape with an optional outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Geometry.
    pub kind: ShapeKind,
    /// Position in the parent's coordinates.
    pub position: Vec2,
    /// Fill color.
    pub fill: Color,
    /// Outline color.
    pub outline_color: Color,
    /// No outline when zero.
    pub outline_thickness: f32,
}

impl Shape {
    /// A `size` rectangle with its top-left corner on the position.
    pub fn rectangle(size: Vec2, fill: Color) -> Self {
        Self::new(ShapeKind::Rectangle(size), fill)
    }

    /// A 30-sided circle centered on the position.
    pub fn circle(radius: f32, fill: Color) -> Self {
        Self::new(ShapeKind::Circle { radius, points: 30 }, fill)
    }

    fn new(kind: ShapeKind, fill: Color) -> Self {
        Shape {
            kind,
            position: Vec2::ZERO,
            fill,
            outline_color: BLANK,
            outline_thickness: 0.0,
        }
    }

    /// Adds an outline.
    pub fn with_outline(mut self, thickness: f32, color: Color) -> Self {
        self.outline_thickness = thickness;
        self.outline_color = color;
        self
    }

    /// Moves the shape to `position`.
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Outline points relative to the position.
    pub fn points(&self) -> Vec<Vec2> {
        match self.kind {
            ShapeKind::Rectangle(size) => vec![
                Vec2::ZERO,
                vec2(size.x, 0.0),
                size,
                vec2(0.0, size.y),
            ],
            ShapeKind::Circle { radius, points } => ellipse_points(
                Rect::new(-radius, -radius, radius * 2.0, radius * 2.0),
                points.max(3),
            ),
        }
    }

    /// Bounds relative to the position, before any render transform.
    pub fn local_bounds(&self) -> Rect {
        match self.kind {
            ShapeKind::Rectangle(size) => Rect::new(0.0, 0.0, size.x, size.y),
            ShapeKind::Circle { radius, .. } => {
                Rect::new(-radius, -radius, radius * 2.0, radius * 2.0)
            }
        }
    }
}

impl Drawable for Shape {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn global_bounds(&self) -> Rect {
        self.local_bounds().offset(self.position)
    }

    fn draw(&self, states: &RenderStates) {
        let states = states.translated(self.position);
        let points = self.points();
        fill_convex(&points, self.fill, &states);
        if self.outline_thickness > 0.0 {
            stroke(&points, true, self.outline_thickness, self.outline_color, &states);
        }
    }
}

/// Bounds of `shape` outline points, mainly for polygons built by hand.
pub fn points_bounds(shape: &Shape) -> Rect {
    bounds_of(&shape.points())
        .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
        .offset(shape.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_kind_and_position() {
        let rect = Shape::rectangle(vec2(10.0, 4.0), RED).at(vec2(2.0, 3.0));
        assert_eq!(rect.global_bounds(), Rect::new(2.0, 3.0, 10.0, 4.0));
        assert_eq!(points_bounds(&rect), rect.global_bounds());

        let circle = Shape::circle(5.0, BLUE).at(vec2(20.0, 20.0));
        assert_eq!(circle.global_bounds(), Rect::new(15.0, 15.0, 10.0, 10.0));
        let outline = points_bounds(&circle);
        assert!(outline.w <= 10.0 + 1e-4 && outline.h <= 10.0 + 1e-4);
        assert_eq!(circle.points().len(), 30);
    }

    #[test]
    fn outline_builder() {
        let s = Shape::rectangle(vec2(1.0, 1.0), WHITE).with_outline(2.0, BLACK);
        assert_eq!(s.outline_thickness, 2.0);
        assert_eq!(s.outline_color, BLACK);
    }
}
