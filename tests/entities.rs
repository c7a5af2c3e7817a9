use macroquad::prelude::*;
use macroquad_tiled_engine::ecs::{
    resolve_collisions, Axis, ColliderComponent, ComponentGroup, ComponentKind, InputsComponent,
    KeyEvent, PhysicsComponent, ShapeComponent, SpriteComponent, TransformComponent,
};
use macroquad_tiled_engine::{Drawable, Scene, Shape, Sprite};

fn player() -> ComponentGroup {
    let mut physics = PhysicsComponent::new(vec2(4.0, 4.0), vec2(100.0, 100.0), vec2(100.0, 100.0));
    physics.direction = Vec2::ZERO;

    let mut inputs = InputsComponent::new();
    inputs.bind(KeyCode::Right, |g| {
        if let Some(p) = g.physics_mut() {
            p.direction.x = 1.0;
        }
    });

    let mut g = ComponentGroup::new("player");
    g.add(TransformComponent::default())
        .add(inputs)
        .add(physics)
        .add(ColliderComponent::new(Rect::new(0.0, 0.0, 8.0, 8.0), true))
        .add(SpriteComponent::new(Sprite::colored(vec2(8.0, 8.0), WHITE)));
    g
}

fn wall(x: f32) -> ComponentGroup {
    let mut g = ComponentGroup::new("wall");
    g.add(TransformComponent::at(vec2(x, 0.0)))
        .add(ColliderComponent::new(Rect::new(0.0, 0.0, 8.0, 8.0), false));
    g
}

#[test]
fn replacing_a_component_keeps_one_per_kind() {
    let mut g = player();
    g.add(TransformComponent::at(vec2(3.0, 3.0)));
    assert_eq!(g.transform().unwrap().position, vec2(3.0, 3.0));
    assert_eq!(
        g.kinds(),
        [
            ComponentKind::Inputs,
            ComponentKind::Physics,
            ComponentKind::Collider,
            ComponentKind::Sprite,
            ComponentKind::Transform,
        ]
    );
    assert_eq!(g.kinds().iter().filter(|k| **k == ComponentKind::Transform).count(), 1);
}

#[test]
fn absent_components_and_children_are_none() {
    let mut g = ComponentGroup::new("ghost");
    assert!(g.get::<ShapeComponent>().is_none());
    assert!(g.transform().is_none());
    assert!(g.child("hat").is_none());
    assert!(g.remove::<SpriteComponent>().is_none());
    assert_eq!(g.global_bounds(), Rect::new(0.0, 0.0, 0.0, 0.0));
}

#[test]
fn input_drives_physics_into_a_wall() {
    let mut world = vec![player(), wall(13.0)];
    world[0].handle_key_event(&KeyEvent::Pressed(KeyCode::Right));

    // accelerates to max speed 4 in the first update, then moves 4 per second
    world[0].update(1.0);
    assert_eq!(world[0].transform().unwrap().position, vec2(4.0, 0.0));
    assert!(resolve_collisions(&mut world).is_empty());

    world[0].update(1.0);
    assert_eq!(world[0].transform().unwrap().position, vec2(8.0, 0.0));
    let contacts = resolve_collisions(&mut world);
    assert_eq!(contacts.len(), 1);
    assert_eq!((contacts[0].a, contacts[0].b), (0, 1));
    assert_eq!(contacts[0].axis, Axis::X);
    assert_eq!(contacts[0].depth, 3.0);
    assert_eq!(world[0].transform().unwrap().position, vec2(5.0, 0.0));
    assert_eq!(world[0].physics().unwrap().velocity.x, 0.0);
    assert_eq!(world[1].transform().unwrap().position, vec2(13.0, 0.0));
}

#[test]
fn children_compose_with_their_parent() {
    let mut ship = ComponentGroup::new("ship");
    ship.add(TransformComponent::at(vec2(100.0, 50.0)));
    ship.add_child("hull")
        .add(ShapeComponent::new(Shape::rectangle(vec2(20.0, 10.0), GRAY)));
    ship.add_child("turret")
        .add(TransformComponent::at(vec2(5.0, -4.0)))
        .add(ShapeComponent::new(Shape::rectangle(vec2(4.0, 4.0), RED)));

    assert_eq!(ship.children().len(), 2);
    assert_eq!(ship.child("turret").unwrap().parent(), Some(ship.id()));
    assert_eq!(ship.global_bounds(), Rect::new(100.0, 46.0, 20.0, 14.0));
}

#[test]
fn entities_live_in_scene_layers() {
    let mut scene = Scene::new();
    let entities = scene.add_layer("entities", 1);
    entities.y_sort = true;
    let hero = entities.add_new(player());
    hero.borrow_mut()
        .transform_mut()
        .unwrap()
        .move_by(vec2(0.0, 10.0));

    assert_eq!(scene.layer("entities").unwrap().len(), 1);
    assert_eq!(hero.borrow().position(), vec2(0.0, 10.0));
}
