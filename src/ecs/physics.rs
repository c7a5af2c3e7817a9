use crate::ecs::component::EntityId;
use crate::ecs::group::ComponentGroup;
use crate::ecs::transform::TransformComponent;
use macroquad::prelude::*;

/// Velocity that eases toward `direction * max_velocity` and moves the
/// entity's transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsComponent {
    pub(crate) owner: Option<EntityId>,
    /// Current velocity in pixels per second.
    pub velocity: Vec2,
    /// Speed cap per axis.
    pub max_velocity: Vec2,
    /// Velocity gained per second while a direction is held.
    pub acceleration: Vec2,
    /// Velocity lost per second on an axis with no direction.
    pub friction: Vec2,
    /// Each axis in `[-1, 1]`.
    pub direction: Vec2,
}

impl PhysicsComponent {
    /// A resting body with no direction.
    pub fn new(max_velocity: Vec2, acceleration: Vec2, friction: Vec2) -> Self {
        PhysicsComponent {
            owner: None,
            velocity: Vec2::ZERO,
            max_velocity,
            acceleration,
            friction,
            direction: Vec2::ZERO,
        }
    }

    pub(crate) fn update(&mut self, group: &mut ComponentGroup, dt: f32) {
        self.velocity.x = step_axis(
            self.velocity.x,
            self.direction.x,
            self.max_velocity.x,
            self.acceleration.x,
            self.friction.x,
            dt,
        );
        self.velocity.y = step_axis(
            self.velocity.y,
            self.direction.y,
            self.max_velocity.y,
            self.acceleration.y,
            self.friction.y,
            dt,
        );
        if let Some(t) = group.get_mut::<TransformComponent>() {
            t.move_by(self.velocity * dt);
        }
    }
}

fn step_axis(velocity: f32, direction: f32, max: f32, acceleration: f32, friction: f32, dt: f32) -> f32 {
    if direction != 0.0 {
        approach(velocity, direction.clamp(-1.0, 1.0) * max, acceleration * dt)
    } else {
        approach(velocity, 0.0, friction * dt)
    }
}

fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}
