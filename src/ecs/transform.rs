use crate::ecs::component::EntityId;
use macroquad::prelude::*;

/// Position, rotation and scale of an entity, applied around `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    pub(crate) owner: Option<EntityId>,
    /// World position of `origin`.
    pub position: Vec2,
    /// Local point that `position` refers to; rotation and scale pivot on it.
    pub origin: Vec2,
    /// Degrees, clockwise on screen.
    pub rotation: f32,
    /// Per-axis scale factor.
    pub scale: Vec2,
}

impl Default for TransformComponent {
    fn default() -> Self {
        TransformComponent {
            owner: None,
            position: Vec2::ZERO,
            origin: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl TransformComponent {
    /// Identity transform placed at `position`.
    pub fn at(position: Vec2) -> Self {
        TransformComponent {
            position,
            ..Default::default()
        }
    }

    /// Local-to-parent matrix.
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation.to_radians(), self.position)
            * Affine2::from_translation(-self.origin)
    }

    /// Translates by `offset`.
    pub fn move_by(&mut self, offset: Vec2) {
        self.position += offset;
    }

    /// Rotates by `degrees`, keeping the angle in `[0, 360)`.
    pub fn rotate(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    /// Multiplies the scale by `factor`.
    pub fn scale_by(&mut self, factor: Vec2) {
        self.scale *= factor;
    }
}
