//! Axis-aligned box colliders and pairwise overlap resolution.

use crate::ecs::component::EntityId;
use crate::ecs::group::ComponentGroup;
use crate::render::transform_rect;
use macroquad::prelude::*;

/// Box used by [`resolve_collisions`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderComponent {
    pub(crate) owner: Option<EntityId>,
    /// Box in the entity's local space.
    pub rect: Rect,
    /// Dynamic colliders are pushed out of overlaps; static ones never move.
    pub dynamic: bool,
}

impl ColliderComponent {
    /// Creates a collider with `rect` in local space.
    pub fn new(rect: Rect, dynamic: bool) -> Self {
        ColliderComponent {
            owner: None,
            rect,
            dynamic,
        }
    }

    /// The box in world space, through the owner's transform when it has one.
    pub fn world_bounds(&self, group: &ComponentGroup) -> Rect {
        match group.transform() {
            Some(t) => transform_rect(&t.matrix(), self.rect),
            None => self.rect,
        }
    }
}

/// Axis a contact was resolved along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// One resolved overlap between `groups[a]` and `groups[b]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Index of the first group.
    pub a: usize,
    /// Index of the second group.
    pub b: usize,
    /// Axis of least penetration.
    pub axis: Axis,
    /// Penetration along `axis` before resolution.
    pub depth: f32,
}

/// Separates every overlapping pair of colliders where at least one side is
/// dynamic.
///
/// Each pair is pushed apart along the axis of least penetration, away from
/// the other box's center. The full depth goes to the dynamic side, or half
/// to each when both are dynamic, and the moved side loses its velocity on
/// that axis. Boxes that only touch are left alone.
pub fn resolve_collisions(groups: &mut [ComponentGroup]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for a in 0..groups.len() {
        for b in a + 1..groups.len() {
            let (Some((ra, da)), Some((rb, db))) = (body(&groups[a]), body(&groups[b])) else {
                continue;
            };
            if !da && !db {
                continue;
            }

            let overlap_x = (ra.x + ra.w).min(rb.x + rb.w) - ra.x.max(rb.x);
            let overlap_y = (ra.y + ra.h).min(rb.y + rb.h) - ra.y.max(rb.y);
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }

            let (axis, depth, a_before_b) = if overlap_x < overlap_y {
                (Axis::X, overlap_x, ra.center().x < rb.center().x)
            } else {
                (Axis::Y, overlap_y, ra.center().y < rb.center().y)
            };
            let share = if da && db { depth / 2.0 } else { depth };
            let away_from_b = if a_before_b { -share } else { share };

            if da {
                push(&mut groups[a], axis, away_from_b);
            }
            if db {
                push(&mut groups[b], axis, -away_from_b);
            }
            contacts.push(Contact { a, b, axis, depth });
        }
    }
    contacts
}

fn body(group: &ComponentGroup) -> Option<(Rect, bool)> {
    let collider = group.collider()?;
    Some((collider.world_bounds(group), collider.dynamic))
}

fn push(group: &mut ComponentGroup, axis: Axis, amount: f32) {
    let delta = match axis {
        Axis::X => vec2(amount, 0.0),
        Axis::Y => vec2(0.0, amount),
    };
    if let Some(t) = group.transform_mut() {
        t.move_by(delta);
    } else if let Some(c) = group.get_mut::<ColliderComponent>() {
        c.rect = c.rect.offset(delta);
    }
    if let Some(p) = group.physics_mut() {
        match axis {
            Axis::X => p.velocity.x = 0.0,
            Axis::Y => p.velocity.y = 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::physics::PhysicsComponent;
    use crate::ecs::transform::TransformComponent;

    fn boxed(name: &str, at: Vec2, dynamic: bool) -> ComponentGroup {
        let mut g = ComponentGroup::new(name);
        g.add(TransformComponent::at(at))
            .add(ColliderComponent::new(Rect::new(0.0, 0.0, 10.0, 10.0), dynamic));
        g
    }

    #[test]
    fn dynamic_box_is_pushed_out_along_x() {
        let mut player = boxed("player", vec2(0.0, 0.0), true);
        let mut physics = PhysicsComponent::new(vec2(5.0, 5.0), Vec2::ZERO, Vec2::ZERO);
        physics.velocity = vec2(3.0, 1.5);
        player.add(physics);
        let mut groups = vec![player, boxed("wall", vec2(8.0, 0.0), false)];

        let contacts = resolve_collisions(&mut groups);
        assert_eq!(
            contacts,
            [Contact {
                a: 0,
                b: 1,
                axis: Axis::X,
                depth: 2.0
            }]
        );
        assert_eq!(groups[0].transform().unwrap().position, vec2(-2.0, 0.0));
        assert_eq!(groups[0].physics().unwrap().velocity, vec2(0.0, 1.5));
        assert_eq!(groups[1].transform().unwrap().position, vec2(8.0, 0.0));
    }

    #[test]
    fn two_dynamic_boxes_share_the_push() {
        let mut groups = vec![
            boxed("a", vec2(0.0, 6.0), true),
            boxed("b", vec2(1.0, 0.0), true),
        ];
        let contacts = resolve_collisions(&mut groups);
        assert_eq!(contacts[0].axis, Axis::Y);
        assert_eq!(groups[0].transform().unwrap().position, vec2(0.0, 8.0));
        assert_eq!(groups[1].transform().unwrap().position, vec2(1.0, -2.0));
    }

    #[test]
    fn touching_and_static_pairs_are_ignored() {
        let mut groups = vec![
            boxed("a", vec2(0.0, 0.0), true),
            boxed("b", vec2(10.0, 0.0), false),
            boxed("c", vec2(12.0, 2.0), false),
        ];
        assert!(resolve_collisions(&mut groups).is_empty());
        assert_eq!(groups[0].transform().unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn collider_without_transform_moves_its_rect() {
        let mut loose = ComponentGroup::new("loose");
        loose.add(ColliderComponent::new(Rect::new(0.0, 0.0, 4.0, 4.0), true));
        let mut groups = vec![loose, boxed("floor", vec2(-3.0, 3.0), false)];
        resolve_collisions(&mut groups);
        assert_eq!(groups[0].collider().unwrap().rect, Rect::new(0.0, -1.0, 4.0, 4.0));
    }
}
