//! Tiled (`.tmx` / `.tsx`) maps: parsing, tileset sharing, tile animation
//! and batched drawing.

/// Layer kinds and layer lookup.
pub mod layer;
/// The map itself.
pub mod map;
pub(crate) mod raw;
/// Chunk math for culling.
pub mod spatial;
/// Tile cells and flip flags.
pub mod tile;
/// Tile grids and their batches.
pub mod tile_layer;
/// Tilesets and the registry sharing them.
pub mod tileset;

pub use layer::{
    GroupLayer, LayerCommon, LayerContainer, MapLayer, MapObject, ObjectLayer, ObjectShape,
    TileObject,
};
pub use map::{MapLayerHandle, TiledMap};
pub use tile::{Tile, TileFlip};
pub use tile_layer::{BatchKey, TileBatch, TileLayer};
pub use tileset::{AnimationFrame, TileData, Tileset, TilesetData, TilesetImage, TilesetRegistry};
