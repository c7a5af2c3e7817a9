//! A small 2D engine on top of macroquad: component-group entities, Tiled
//! (`.tmx`/`.tsx`) maps, layered scenes seen through cameras, bitmap-font
//! text and debug readouts.
//!
//! Parsing never needs a window. Textures are attached afterwards with
//! [`TiledMap::load_textures`], and anything drawn before that is skipped.

#![warn(missing_docs)]

pub mod config;
pub mod debug;
pub mod ecs;
/// The crate error type.
pub mod error;
pub mod properties;
pub mod render;
pub mod text;
pub mod tilemap;

pub use config::{EngineConfig, TextureFilter, TextureSettings};
pub use debug::DebugText;
pub use error::{EngineError, Result};
pub use properties::{Properties, PropertyValue};
pub use render::{Camera, Drawable, Layer, RenderStates, Scene, Shape, SharedDrawable, Sprite};
pub use text::{BitmapFont, BitmapGlyph, BitmapText};
pub use tilemap::{LayerContainer, MapLayer, MapLayerHandle, TiledMap, TilesetRegistry};
