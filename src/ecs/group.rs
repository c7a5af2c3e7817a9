use crate::ecs::collider::ColliderComponent;
use crate::ecs::component::{AnyComponent, Component, ComponentKind, EntityId};
use crate::ecs::inputs::{InputsComponent, KeyEvent};
use crate::ecs::physics::PhysicsComponent;
use crate::ecs::transform::TransformComponent;
use crate::render::{transform_rect, union_rect, Drawable, RenderStates};
use macroquad::prelude::*;
use std::fmt;

/// An entity: at most one component per kind plus named child entities.
pub struct ComponentGroup {
    id: EntityId,
    name: String,
    parent: Option<EntityId>,
    slots: [Option<AnyComponent>; ComponentKind::COUNT],
    /// Kinds in insertion order.
    order: Vec<ComponentKind>,
    children: Vec<ComponentGroup>,
}

impl fmt::Debug for ComponentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kinds", &self.order)
            .field("children", &self.children)
            .finish()
    }
}

impl ComponentGroup {
    /// Creates an empty group with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        ComponentGroup {
            id: EntityId::next(),
            name: name.into(),
            parent: None,
            slots: Default::default(),
            order: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Unique id of this group.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Name given at creation; children are looked up by it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the group this one is a child of.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Attaches `component`, dropping any previous one of the same kind.
    /// The kind moves to the end of the insertion order.
    pub fn add<T: Component>(&mut self, mut component: T) -> &mut Self {
        component.set_owner(Some(self.id));
        self.slots[T::KIND.index()] = Some(component.into_any());
        self.order.retain(|k| *k != T::KIND);
        self.order.push(T::KIND);
        self
    }

    /// The component of kind `T`, if attached.
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.slots[T::KIND.index()].as_ref().and_then(T::from_any)
    }

    /// Mutable form of [`ComponentGroup::get`].
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots[T::KIND.index()].as_mut().and_then(T::from_any_mut)
    }

    /// Whether a component of kind `T` is attached.
    pub fn has<T: Component>(&self) -> bool {
        self.slots[T::KIND.index()].is_some()
    }

    /// Detaches and returns the component of kind `T`. Called from that
    /// component's own update, it only detaches.
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.order.retain(|k| *k != T::KIND);
        let any = self.slots[T::KIND.index()].take()?;
        let mut component = T::from_any_owned(any)?;
        component.set_owner(None);
        Some(component)
    }

    /// Attached kinds in insertion order.
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.order
    }

    /// Drawable kinds in the order they are drawn.
    pub fn graphics(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.order.iter().copied().filter(|k| k.is_graphics())
    }

    /// Shorthand for `get::<TransformComponent>()`.
    pub fn transform(&self) -> Option<&TransformComponent> {
        self.get()
    }

    /// Shorthand for `get_mut::<TransformComponent>()`.
    pub fn transform_mut(&mut self) -> Option<&mut TransformComponent> {
        self.get_mut()
    }

    /// Shorthand for `get::<PhysicsComponent>()`.
    pub fn physics(&self) -> Option<&PhysicsComponent> {
        self.get()
    }

    /// Shorthand for `get_mut::<PhysicsComponent>()`.
    pub fn physics_mut(&mut self) -> Option<&mut PhysicsComponent> {
        self.get_mut()
    }

    /// Shorthand for `get::<ColliderComponent>()`.
    pub fn collider(&self) -> Option<&ColliderComponent> {
        self.get()
    }

    /// Shorthand for `get::<InputsComponent>()`.
    pub fn inputs(&self) -> Option<&InputsComponent> {
        self.get()
    }

    /// Shorthand for `get_mut::<InputsComponent>()`.
    pub fn inputs_mut(&mut self) -> Option<&mut InputsComponent> {
        self.get_mut()
    }

    /// Creates an empty child named `name`, replacing one with the same name.
    pub fn add_child(&mut self, name: &str) -> &mut ComponentGroup {
        let mut child = ComponentGroup::new(name);
        child.parent = Some(self.id);
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(existing) => {
                self.children[existing] = child;
                existing
            }
            None => {
                self.children.push(child);
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// The child named `name`.
    pub fn child(&self, name: &str) -> Option<&ComponentGroup> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable form of [`ComponentGroup::child`].
    pub fn child_mut(&mut self, name: &str) -> Option<&mut ComponentGroup> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Detaches the child named `name`.
    pub fn remove_child(&mut self, name: &str) -> Option<ComponentGroup> {
        let index = self.children.iter().position(|c| c.name == name)?;
        let mut child = self.children.remove(index);
        child.parent = None;
        Some(child)
    }

    /// Children in creation order.
    pub fn children(&self) -> &[ComponentGroup] {
        &self.children
    }

    /// Updates components in insertion order, then children.
    ///
    /// A component is taken out of its slot while it updates, so it does not
    /// see itself through `get`. If it was removed or replaced meanwhile, the
    /// taken instance is dropped.
    pub fn update(&mut self, dt: f32) {
        let mut order = [None; ComponentKind::COUNT];
        for (slot, kind) in order.iter_mut().zip(&self.order) {
            *slot = Some(*kind);
        }
        for kind in order.into_iter().flatten() {
            let Some(mut component) = self.slots[kind.index()].take() else {
                continue;
            };
            component.update(self, dt);
            let slot = &mut self.slots[kind.index()];
            if slot.is_none() && self.order.contains(&kind) {
                *slot = Some(component);
            }
        }
        for child in &mut self.children {
            child.update(dt);
        }
    }

    /// Feeds a key event to this group's inputs and to every child.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        if let Some(inputs) = self.inputs_mut() {
            inputs.handle_event(event);
        }
        for child in &mut self.children {
            child.handle_key_event(event);
        }
    }

    fn matrix(&self) -> Affine2 {
        self.transform()
            .map_or(Affine2::IDENTITY, TransformComponent::matrix)
    }

    fn drawables(&self) -> impl Iterator<Item = &dyn Drawable> + '_ {
        self.graphics()
            .filter_map(|k| self.slots[k.index()].as_ref()?.as_drawable())
    }
}

impl Drawable for ComponentGroup {
    fn position(&self) -> Vec2 {
        self.transform().map_or(Vec2::ZERO, |t| t.position)
    }

    fn global_bounds(&self) -> Rect {
        let local = self
            .drawables()
            .map(|d| d.global_bounds())
            .chain(self.children.iter().map(Drawable::global_bounds))
            .reduce(union_rect);
        match local {
            Some(r) => transform_rect(&self.matrix(), r),
            None => Rect::new(self.position().x, self.position().y, 0.0, 0.0),
        }
    }

    fn draw(&self, states: &RenderStates) {
        let states = states.transformed(self.matrix());
        for drawable in self.drawables() {
            drawable.draw(&states);
        }
        for child in &self.children {
            child.draw(&states);
        }
    }
}
