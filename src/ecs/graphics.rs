use crate::ecs::component::{EntityId, GraphicsComponent};
use crate::render::{Drawable, Shape, Sprite};

/// A sprite drawn in its entity's local space.
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    pub(crate) owner: Option<EntityId>,
    /// The drawn sprite.
    pub sprite: Sprite,
}

impl SpriteComponent {
    /// Wraps `sprite`.
    pub fn new(sprite: Sprite) -> Self {
        SpriteComponent { owner: None, sprite }
    }
}

impl GraphicsComponent for SpriteComponent {
    fn drawable(&self) -> &dyn Drawable {
        &self.sprite
    }
}

/// A shape drawn in its entity's local space.
#[derive(Debug, Clone)]
pub struct ShapeComponent {
    pub(crate) owner: Option<EntityId>,
    /// The drawn shape.
    pub shape: Shape,
}

impl ShapeComponent {
    /// Wraps `shape`.
    pub fn new(shape: Shape) -> Self {
        ShapeComponent { owner: None, shape }
    }
}

impl GraphicsComponent for ShapeComponent {
    fn drawable(&self) -> &dyn Drawable {
        &self.shape
    }
}
