use crate::config::TextureSettings;
use crate::error::{EngineError, Result};
use crate::properties::Properties;
use crate::render::{Drawable, RenderStates};
use crate::tilemap::layer::{build_layers, LayerContainer, MapContext, MapLayer};
use crate::tilemap::raw::{self, RawLayerNode, RawMap, RawMapNode, RawTileset};
use crate::tilemap::tile::GID_MASK;
use crate::tilemap::tileset::{tileset_index_for_gid, Tileset, TilesetData, TilesetRegistry};
use macroquad::prelude::*;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// An orthogonal Tiled map: tilesets ordered by `firstgid` and the layer tree
/// in document order.
#[derive(Debug)]
pub struct TiledMap {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    properties: Properties,
    tilesets: Vec<Tileset>,
    layers: Vec<MapLayer>,
    source: Option<PathBuf>,
}

impl TiledMap {
    /// Loads a `.tmx` file. External tilesets go through `registry`, so maps
    /// loaded with the same registry share them.
    pub fn load_from_file(path: impl AsRef<Path>, registry: &mut TilesetRegistry) -> Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut map = Self::parse(&txt, base_dir, registry, &path.display().to_string())?;
        map.source = Some(path.to_path_buf());
        log::debug!(
            "loaded map {} ({}x{}, {} tilesets)",
            path.display(),
            map.width,
            map.height,
            map.tilesets.len()
        );
        Ok(map)
    }

    /// Parses a map document; relative paths resolve against the working
    /// directory.
    pub fn load_from_str(xml: &str, registry: &mut TilesetRegistry) -> Result<Self> {
        Self::parse(xml, Path::new(""), registry, "<string>")
    }

    /// Parses a map document whose relative paths resolve against `base_dir`.
    pub fn load_from_str_with_base(
        xml: &str,
        base_dir: impl AsRef<Path>,
        registry: &mut TilesetRegistry,
    ) -> Result<Self> {
        Self::parse(xml, base_dir.as_ref(), registry, "<string>")
    }

    fn parse(
        xml: &str,
        base_dir: &Path,
        registry: &mut TilesetRegistry,
        origin: &str,
    ) -> Result<Self> {
        let raw: RawMap = raw::decode(xml, origin)?;
        if raw.infinite {
            return Err(EngineError::InvalidMap(format!(
                "{origin}: infinite maps are not supported"
            )));
        }
        if raw.tilewidth == 0 || raw.tileheight == 0 {
            return Err(EngineError::InvalidMap(format!("{origin}: tile size is zero")));
        }
        if let Some(o) = raw.orientation.as_deref().filter(|o| *o != "orthogonal") {
            log::warn!("{origin}: '{o}' orientation is drawn as orthogonal");
        }

        let mut properties = Properties::new();
        let mut tilesets = Vec::new();
        let mut nodes = Vec::new();
        for child in raw.children {
            match child {
                RawMapNode::Properties(p) => properties = Properties::from_raw(Some(p))?,
                RawMapNode::Tileset(ts) => tilesets.push(load_tileset(ts, base_dir, registry)?),
                RawMapNode::Layer(l) => nodes.push(RawLayerNode::Layer(l)),
                RawMapNode::Objectgroup(o) => nodes.push(RawLayerNode::Objectgroup(o)),
                RawMapNode::Group(g) => nodes.push(RawLayerNode::Group(g)),
                RawMapNode::Imagelayer(i) => nodes.push(RawLayerNode::Imagelayer(i)),
                RawMapNode::Other => {}
            }
        }
        tilesets.sort_by_key(|t| t.firstgid);

        let ctx = MapContext {
            tilesets: &tilesets,
            tile_size: vec2(raw.tilewidth as f32, raw.tileheight as f32),
        };
        let layers = build_layers(nodes, &ctx, &mut properties)?;

        Ok(TiledMap {
            width: raw.width,
            height: raw.height,
            tile_width: raw.tilewidth,
            tile_height: raw.tileheight,
            properties,
            tilesets,
            layers,
            source: None,
        })
    }

    /// Size in pixels.
    pub fn size(&self) -> Vec2 {
        vec2(
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }

    /// Size in tiles.
    pub fn grid_size(&self) -> UVec2 {
        uvec2(self.width, self.height)
    }

    /// Size of one tile in pixels.
    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_width as f32, self.tile_height as f32)
    }

    /// Map custom properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Tilesets ordered by `firstgid`.
    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// File the map was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The tileset whose gid range holds `gid`; flip bits are ignored.
    pub fn tile_tileset(&self, gid: u32) -> Result<&Tileset> {
        let index = tileset_index_for_gid(&self.tilesets, gid & GID_MASK)?;
        Ok(&self.tilesets[index])
    }

    /// Advances every tile animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for layer in &mut self.layers {
            layer.update(dt);
        }
    }

    /// Loads the texture of every tileset this map uses.
    pub async fn load_textures(&self, settings: &TextureSettings) -> anyhow::Result<()> {
        for ts in &self.tilesets {
            ts.data.load_texture(settings).await?;
        }
        Ok(())
    }

    /// A drawable pointing at one layer of a shared map. `None` when the path
    /// does not name a layer.
    pub fn layer_handle(map: &Rc<RefCell<TiledMap>>, path: &[&str]) -> Option<MapLayerHandle> {
        map.borrow().layer_at_path(path)?;
        Some(MapLayerHandle {
            map: Rc::downgrade(map),
            path: path.iter().map(|s| (*s).to_owned()).collect(),
        })
    }
}

fn load_tileset(
    mut raw: RawTileset,
    base_dir: &Path,
    registry: &mut TilesetRegistry,
) -> Result<Tileset> {
    let firstgid = raw
        .firstgid
        .filter(|gid| *gid > 0)
        .ok_or_else(|| EngineError::InvalidMap(format!("tileset '{}' has no firstgid", raw.name)))?;
    let data = match raw.source.take() {
        Some(source) => registry.get(base_dir.join(source))?,
        None => Rc::new(TilesetData::from_raw(raw, base_dir)?),
    };
    Ok(Tileset::new(data, firstgid))
}

impl LayerContainer for TiledMap {
    fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut [MapLayer] {
        &mut self.layers
    }
}

impl Drawable for TiledMap {
    fn position(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn global_bounds(&self) -> Rect {
        let size = self.size();
        Rect::new(0.0, 0.0, size.x, size.y)
    }

    fn draw(&self, states: &RenderStates) {
        for layer in &self.layers {
            layer.draw(states);
        }
    }
}

/// Draws one layer of a map it does not own. Once the map is dropped the
/// handle draws nothing.
#[derive(Debug, Clone)]
pub struct MapLayerHandle {
    map: Weak<RefCell<TiledMap>>,
    path: Vec<String>,
}

impl MapLayerHandle {
    /// Whether the map still exists.
    pub fn is_alive(&self) -> bool {
        self.map.strong_count() > 0
    }

    /// Layer path inside the map.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    fn with_layer<R>(&self, f: impl FnOnce(&MapLayer) -> R) -> Option<R> {
        let map = self.map.upgrade()?;
        let map = map.try_borrow().ok()?;
        let path: Vec<&str> = self.path.iter().map(String::as_str).collect();
        let result = map.layer_at_path(&path).map(f);
        result
    }
}

impl Drawable for MapLayerHandle {
    fn position(&self) -> Vec2 {
        self.with_layer(|l| l.position()).unwrap_or(Vec2::ZERO)
    }

    fn global_bounds(&self) -> Rect {
        self.with_layer(|l| l.global_bounds())
            .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }

    fn draw(&self, states: &RenderStates) {
        if self.with_layer(|l| l.draw(states)).is_none() {
            log::trace!("map layer {:?} is gone", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="3" height="2" tilewidth="8" tileheight="8" infinite="0">
 <properties>
  <property name="music" type="file" value="cave.ogg"/>
 </properties>
 <tileset firstgid="11" name="small" tilewidth="8" tileheight="8" tilecount="5" columns="5">
  <image source="small.png" width="40" height="8"/>
 </tileset>
 <tileset firstgid="1" name="big" tilewidth="8" tileheight="8" tilecount="10" columns="5">
  <image source="big.png" width="40" height="16"/>
  <tile id="0"><animation><frame tileid="0" duration="100"/><frame tileid="1" duration="100"/></animation></tile>
 </tileset>
 <layer name="ground" width="3" height="2">
  <data encoding="csv">1,2,11,
15,0,3221225482</data>
 </layer>
 <group name="Group 1" opacity="0.5">
  <group name="Group 2">
   <layer name="deco" width="3" height="2"><data encoding="csv">1,0,0,0,0,0</data></layer>
  </group>
  <objectgroup name="collisions"><object id="1" x="0" y="0" width="8" height="8"/></objectgroup>
 </group>
</map>"#;

    fn load() -> TiledMap {
        TiledMap::load_from_str(MAP, &mut TilesetRegistry::new()).expect("map loads")
    }

    #[test]
    fn map_attributes() {
        let map = load();
        assert_eq!(map.grid_size(), uvec2(3, 2));
        assert_eq!(map.tile_size(), vec2(8.0, 8.0));
        assert_eq!(map.size(), vec2(24.0, 16.0));
        assert_eq!(map.global_bounds(), Rect::new(0.0, 0.0, 24.0, 16.0));
        assert_eq!(map.properties().get_string("music"), Some("cave.ogg"));
        let names: Vec<&str> = map.layers().iter().map(MapLayer::name).collect();
        assert_eq!(names, ["ground", "Group 1"]);
    }

    #[test]
    fn gid_resolution_picks_the_covering_tileset() {
        let map = load();
        let firstgids: Vec<u32> = map.tilesets().iter().map(|t| t.firstgid).collect();
        assert_eq!(firstgids, [1, 11]);

        assert_eq!(map.tile_tileset(11).unwrap().name, "small");
        assert_eq!(map.tile_tileset(10).unwrap().name, "big");
        assert_eq!(map.tile_tileset(0x8000_0000 | 12).unwrap().name, "small");
        assert!(matches!(
            map.tile_tileset(16).err().unwrap(),
            EngineError::TileNotFound(16)
        ));
    }

    #[test]
    fn grid_keeps_raw_gids() {
        let map = load();
        let ground = map.tile_layer("ground").unwrap();
        let raw: Vec<u32> = ground.tiles().iter().map(|t| t.raw()).collect();
        assert_eq!(raw, [1, 2, 11, 15, 0, 3221225482]);
    }

    #[test]
    fn nested_layers_are_reachable() {
        let map = load();
        assert!(map.layer_at_path(&["Group 1", "Group 2", "deco"]).is_some());
        assert!(map.find_layer("collisions").is_some());
        assert!(map.layer("deco").is_none());
        let group = map.group_layer("Group 1").unwrap();
        assert_eq!(group.object_layer("collisions").unwrap().rectangles().len(), 1);
    }

    #[test]
    fn update_reaches_nested_tile_layers() {
        let mut map = load();
        map.update(0.1);
        let deco = map.layer_at_path(&["Group 1", "Group 2", "deco"]).unwrap();
        assert_eq!(deco.as_tile().unwrap().animation_frame(1), Some(1));
        assert_eq!(map.tile_layer("ground").unwrap().animation_frame(1), Some(1));
    }

    #[test]
    fn malformed_documents_are_errors() {
        let mut registry = TilesetRegistry::new();
        let err = TiledMap::load_from_str("<map width=", &mut registry).err().unwrap();
        assert!(matches!(err, EngineError::FileParse { .. }));

        let infinite = r#"<map width="1" height="1" tilewidth="8" tileheight="8" infinite="1"/>"#;
        let err = TiledMap::load_from_str(infinite, &mut registry).err().unwrap();
        assert!(matches!(err, EngineError::InvalidMap(_)));

        let unresolved = r#"<map width="1" height="1" tilewidth="8" tileheight="8">
 <layer name="l" width="1" height="1"><data encoding="csv">7</data></layer>
</map>"#;
        let err = TiledMap::load_from_str(unresolved, &mut registry).err().unwrap();
        assert!(matches!(err, EngineError::TileNotFound(7)));
    }

    #[test]
    fn huge_grids_do_not_overflow() {
        let mut registry = TilesetRegistry::new();
        let empty = r#"<map width="65536" height="65536" tilewidth="64" tileheight="64"/>"#;
        let map = TiledMap::load_from_str(empty, &mut registry).unwrap();
        assert_eq!(map.size(), vec2(4194304.0, 4194304.0));

        let hollow = r#"<map width="65536" height="65536" tilewidth="8" tileheight="8">
 <layer name="l" width="65536" height="65536"><data encoding="csv"></data></layer>
</map>"#;
        let err = TiledMap::load_from_str(hollow, &mut registry).err().unwrap();
        assert!(matches!(
            err,
            EngineError::InvalidLayerSize { found: 0, .. } | EngineError::InvalidMap(_)
        ));
    }

    #[test]
    fn layer_handle_follows_map_lifetime() {
        let map = Rc::new(RefCell::new(load()));
        assert!(TiledMap::layer_handle(&map, &["nope"]).is_none());

        let handle = TiledMap::layer_handle(&map, &["Group 1", "collisions"]).unwrap();
        assert!(handle.is_alive());
        assert_eq!(handle.global_bounds(), Rect::new(0.0, 0.0, 8.0, 8.0));

        drop(map);
        assert!(!handle.is_alive());
        assert_eq!(handle.global_bounds(), Rect::new(0.0, 0.0, 0.0, 0.0));
        handle.draw(&RenderStates::default());
    }
}
