//! A keyboard-driven box pushing against static walls, followed by a camera.

use macroquad::prelude::*;
use macroquad_tiled_engine::ecs::{
    poll_key_events, resolve_collisions, ColliderComponent, ComponentGroup, InputsComponent,
    PhysicsComponent, ShapeComponent, TransformComponent,
};
use macroquad_tiled_engine::text::DEFAULT_CHARS;
use macroquad_tiled_engine::{
    BitmapFont, BitmapText, Camera, DebugText, Drawable, EngineConfig, RenderStates, Scene,
    Shape,
};
use std::rc::Rc;

fn window_conf() -> Conf {
    EngineConfig {
        title: "entities".to_owned(),
        ..EngineConfig::default()
    }
    .window_conf()
}

fn player() -> ComponentGroup {
    let mut inputs = InputsComponent::new();
    let steer = |dir: Vec2| {
        move |g: &mut ComponentGroup| {
            if let Some(p) = g.physics_mut() {
                p.direction += dir;
            }
        }
    };
    inputs.bind(KeyCode::Left, steer(vec2(-1.0, 0.0)));
    inputs.bind(KeyCode::Right, steer(vec2(1.0, 0.0)));
    inputs.bind(KeyCode::Up, steer(vec2(0.0, -1.0)));
    inputs.bind(KeyCode::Down, steer(vec2(0.0, 1.0)));

    let mut g = ComponentGroup::new("player");
    g.add(TransformComponent::at(vec2(100.0, 100.0)))
        .add(inputs)
        .add(PhysicsComponent::new(
            vec2(200.0, 200.0),
            vec2(900.0, 900.0),
            vec2(1200.0, 1200.0),
        ))
        .add(ColliderComponent::new(Rect::new(0.0, 0.0, 24.0, 24.0), true))
        .add(ShapeComponent::new(
            Shape::rectangle(vec2(24.0, 24.0), SKYBLUE).with_outline(2.0, WHITE),
        ));
    g.add_child("eye")
        .add(TransformComponent::at(vec2(12.0, 8.0)))
        .add(ShapeComponent::new(Shape::circle(4.0, BLACK)));
    g
}

fn wall(rect: Rect) -> ComponentGroup {
    let mut g = ComponentGroup::new("wall");
    g.add(TransformComponent::at(rect.point()))
        .add(ColliderComponent::new(Rect::new(0.0, 0.0, rect.w, rect.h), false))
        .add(ShapeComponent::new(Shape::rectangle(rect.size(), DARKGRAY)));
    g
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let config = EngineConfig::default();

    let mut world = vec![
        player(),
        wall(Rect::new(0.0, 0.0, 800.0, 16.0)),
        wall(Rect::new(0.0, 584.0, 800.0, 16.0)),
        wall(Rect::new(0.0, 16.0, 16.0, 568.0)),
        wall(Rect::new(784.0, 16.0, 16.0, 568.0)),
        wall(Rect::new(300.0, 250.0, 120.0, 40.0)),
    ];

    let mut hud = Scene::new();
    hud.default_layer_mut()
        .add_new(DebugText::new("FPS", get_fps).at(vec2(10.0, 10.0)));
    match BitmapFont::load("assets/font.png", uvec2(8, 8), DEFAULT_CHARS, &[], &config.texture_settings()).await {
        Ok(font) => {
            let mut title = BitmapText::new("ARROWS TO MOVE");
            title.position = vec2(10.0, 40.0);
            match title.set_font(Rc::new(font)) {
                Ok(()) => {
                    hud.default_layer_mut().add_new(title);
                }
                Err(err) => log::warn!("{err}"),
            }
        }
        Err(err) => log::info!("no bitmap font: {err:#}"),
    }

    let mut camera = Camera::new(Rect::new(0.0, 0.0, screen_width(), screen_height()));
    camera.set_limits(Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
    camera.set_frames_delay(8);

    loop {
        let dt = get_frame_time();
        let events = poll_key_events();
        for entity in &mut world {
            if let Some(p) = entity.physics_mut() {
                p.direction = Vec2::ZERO;
            }
            for event in &events {
                entity.handle_key_event(event);
            }
            entity.update(dt);
        }
        resolve_collisions(&mut world);

        let player_center = world[0].global_bounds().center();
        camera.update(Some(player_center));

        clear_background(Color::from_rgba(20, 20, 28, 255));
        set_camera(&camera.to_camera2d());
        let states = RenderStates {
            view: Some(camera.visible_rect()),
            ..Default::default()
        };
        for entity in &world {
            entity.draw(&states);
        }
        set_default_camera();
        hud.render(&RenderStates::default());

        next_frame().await;
    }
}
