//! Entities as component groups.
//!
//! A [`ComponentGroup`] owns at most one component of each
//! [`ComponentKind`], named child groups, and draws its graphics components
//! through its transform.

pub mod collider;
pub mod component;
/// Sprite and shape components.
pub mod graphics;
/// The entity type.
pub mod group;
/// Keyboard bindings.
pub mod inputs;
/// Velocity and friction.
pub mod physics;
/// Local transforms.
pub mod transform;

pub use collider::{resolve_collisions, Axis, ColliderComponent, Contact};
pub use component::{AnyComponent, Component, ComponentKind, EntityId, GraphicsComponent};
pub use graphics::{ShapeComponent, SpriteComponent};
pub use group::ComponentGroup;
pub use inputs::{poll_key_events, InputCallback, InputsComponent, KeyEvent};
pub use physics::PhysicsComponent;
pub use transform::TransformComponent;
