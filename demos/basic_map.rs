//! Scrolls a Tiled map with the arrow keys.
//!
//! `cargo run --example basic_map -- assets/level.tmx`

use macroquad::prelude::*;
use macroquad_tiled_engine::{
    Camera, DebugText, EngineConfig, LayerContainer, RenderStates, Scene, TiledMap,
    TilesetRegistry,
};
use std::cell::RefCell;
use std::rc::Rc;

const CONFIG_PATH: &str = "assets/engine.ron";

fn config() -> EngineConfig {
    EngineConfig::load(CONFIG_PATH).unwrap_or_else(|err| {
        log::info!("using default settings: {err}");
        EngineConfig::default()
    })
}

fn window_conf() -> Conf {
    config().window_conf()
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        log::error!("{err:#}");
    }
}

async fn run() -> anyhow::Result<()> {
    let config = config();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/level.tmx".to_owned());

    let mut registry = TilesetRegistry::new();
    let map = TiledMap::load_from_file(&path, &mut registry)?;
    map.load_textures(&config.texture_settings()).await?;
    let map_size = map.size();
    let top_layers: Vec<String> = map.layers().iter().map(|l| l.name().to_owned()).collect();
    let map = Rc::new(RefCell::new(map));

    // one scene layer per top-level map layer
    let mut scene = Scene::new();
    for (order, name) in top_layers.iter().enumerate() {
        if let Some(handle) = TiledMap::layer_handle(&map, &[name.as_str()]) {
            scene.add_layer(name, order as i32).add_new(handle);
        }
    }

    let mut hud = Scene::new();
    hud.default_layer_mut()
        .add_new(DebugText::new("FPS", get_fps).at(vec2(10.0, 10.0)));
    let camera_pos = Rc::new(RefCell::new(Vec2::ZERO));
    let readout = Rc::clone(&camera_pos);
    hud.default_layer_mut().add_new(
        DebugText::new("camera", move || {
            let p = *readout.borrow();
            format!("{:.0},{:.0}", p.x, p.y)
        })
        .at(vec2(10.0, 34.0)),
    );

    let mut camera = Camera::new(Rect::new(0.0, 0.0, screen_width(), screen_height()));
    camera.set_limits(Some(Rect::new(0.0, 0.0, map_size.x, map_size.y)));
    camera.set_frames_delay(config.camera_frames_delay);
    let mut target = camera.center();

    loop {
        let dt = get_frame_time();
        let speed = 240.0 * dt;
        if is_key_down(KeyCode::Left) {
            target.x -= speed;
        }
        if is_key_down(KeyCode::Right) {
            target.x += speed;
        }
        if is_key_down(KeyCode::Up) {
            target.y -= speed;
        }
        if is_key_down(KeyCode::Down) {
            target.y += speed;
        }
        target = target.clamp(Vec2::ZERO, map_size);

        map.borrow_mut().update(dt);
        camera.update(Some(target));
        *camera_pos.borrow_mut() = camera.center();

        clear_background(BLACK);
        camera.render(&mut scene);
        hud.render(&RenderStates::default());

        next_frame().await;
    }
}
