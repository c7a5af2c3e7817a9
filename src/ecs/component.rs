//! Component kinds and the glue that stores them in a [`ComponentGroup`].
//!
//! The set of kinds is closed: every concrete component has a
//! [`ComponentKind`] tag and a variant in [`AnyComponent`], and a group keeps
//! at most one of each, in a slot indexed by the tag.

use crate::ecs::collider::ColliderComponent;
use crate::ecs::graphics::{ShapeComponent, SpriteComponent};
use crate::ecs::group::ComponentGroup;
use crate::ecs::inputs::InputsComponent;
use crate::ecs::physics::PhysicsComponent;
use crate::ecs::transform::TransformComponent;
use crate::render::Drawable;
use std::sync::atomic::{AtomicU32, Ordering};

/// Tag of a concrete component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// [`TransformComponent`].
    Transform,
    /// [`PhysicsComponent`].
    Physics,
    /// [`ColliderComponent`].
    Collider,
    /// [`InputsComponent`].
    Inputs,
    /// [`SpriteComponent`].
    Sprite,
    /// [`ShapeComponent`].
    Shape,
}

impl ComponentKind {
    /// Number of kinds.
    pub const COUNT: usize = 6;

    /// Every kind, in declaration order.
    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Transform,
        ComponentKind::Physics,
        ComponentKind::Collider,
        ComponentKind::Inputs,
        ComponentKind::Sprite,
        ComponentKind::Shape,
    ];

    /// Slot index of this kind.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kinds that are drawn as part of their group.
    pub fn is_graphics(self) -> bool {
        matches!(self, ComponentKind::Sprite | ComponentKind::Shape)
    }
}

/// Identifies one [`ComponentGroup`] for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        EntityId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The numeric id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A concrete component kind.
///
/// Implemented through the `component!` macro for every variant of
/// [`AnyComponent`]; the owner is assigned by the group on insertion and
/// cleared on removal.
pub trait Component: Sized + 'static {
    /// Tag of the implementing type.
    const KIND: ComponentKind;

    /// The group this component is attached to. Only an id: look the group
    /// up before using it.
    fn owner(&self) -> Option<EntityId>;
    /// Called by the group on insertion and removal.
    fn set_owner(&mut self, owner: Option<EntityId>);

    /// Wraps the component in its [`AnyComponent`] variant.
    fn into_any(self) -> AnyComponent;
    /// Borrows the component out of a matching variant.
    fn from_any(any: &AnyComponent) -> Option<&Self>;
    /// Mutable form of [`Component::from_any`].
    fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self>;
    /// Unwraps a matching variant.
    fn from_any_owned(any: AnyComponent) -> Option<Self>;
}

/// Components that are drawn with their group.
pub trait GraphicsComponent: Component {
    /// What gets drawn for this component.
    fn drawable(&self) -> &dyn Drawable;
}

/// A component of any kind, as stored in a group slot.
pub enum AnyComponent {
    /// Position, rotation and scale.
    Transform(TransformComponent),
    /// Velocity integration.
    Physics(PhysicsComponent),
    /// AABB collider.
    Collider(ColliderComponent),
    /// Key bindings.
    Inputs(InputsComponent),
    /// Sprite graphics.
    Sprite(SpriteComponent),
    /// Shape graphics.
    Shape(ShapeComponent),
}

impl AnyComponent {
    /// The tag of the held component.
    pub fn kind(&self) -> ComponentKind {
        match self {
            AnyComponent::Transform(_) => ComponentKind::Transform,
            AnyComponent::Physics(_) => ComponentKind::Physics,
            AnyComponent::Collider(_) => ComponentKind::Collider,
            AnyComponent::Inputs(_) => ComponentKind::Inputs,
            AnyComponent::Sprite(_) => ComponentKind::Sprite,
            AnyComponent::Shape(_) => ComponentKind::Shape,
        }
    }

    /// Runs the per-frame behavior of kinds that have one. The component is
    /// detached from `group` while this runs.
    pub(crate) fn update(&mut self, group: &mut ComponentGroup, dt: f32) {
        match self {
            AnyComponent::Physics(c) => c.update(group, dt),
            AnyComponent::Inputs(c) => c.update(group, dt),
            _ => {}
        }
    }

    pub(crate) fn as_drawable(&self) -> Option<&dyn Drawable> {
        match self {
            AnyComponent::Sprite(c) => Some(c.drawable()),
            AnyComponent::Shape(c) => Some(c.drawable()),
            _ => None,
        }
    }
}

macro_rules! component {
    ($ty:ty => $variant:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn owner(&self) -> Option<EntityId> {
                self.owner
            }

            fn set_owner(&mut self, owner: Option<EntityId>) {
                self.owner = owner;
            }

            fn into_any(self) -> AnyComponent {
                AnyComponent::$variant(self)
            }

            fn from_any(any: &AnyComponent) -> Option<&Self> {
                match any {
                    AnyComponent::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self> {
                match any {
                    AnyComponent::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn from_any_owned(any: AnyComponent) -> Option<Self> {
                match any {
                    AnyComponent::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }
    };
}

component!(TransformComponent => Transform);
component!(PhysicsComponent => Physics);
component!(ColliderComponent => Collider);
component!(InputsComponent => Inputs);
component!(SpriteComponent => Sprite);
component!(ShapeComponent => Shape);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_index_their_slots() {
        for (i, kind) in ComponentKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert!(ComponentKind::Sprite.is_graphics());
        assert!(!ComponentKind::Collider.is_graphics());
    }

    #[test]
    fn entity_ids_are_unique() {
        let a = EntityId::next();
        let b = EntityId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn any_component_round_trip_by_kind() {
        let any = TransformComponent::default().into_any();
        assert_eq!(any.kind(), ComponentKind::Transform);
        assert!(PhysicsComponent::from_any(&any).is_none());
        assert!(TransformComponent::from_any_owned(any).is_some());
    }
}
