use macroquad::prelude::*;
use macroquad_tiled_engine::tilemap::{MapLayer, ObjectShape, Tile, TileFlip};
use macroquad_tiled_engine::{EngineError, LayerContainer, TiledMap, TilesetRegistry};
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;

const TERRAIN_TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" tilecount="8" columns="4">
 <image source="terrain.png" width="64" height="32"/>
 <tile id="2">
  <properties><property name="solid" type="bool" value="true"/></properties>
 </tile>
 <tile id="4">
  <animation>
   <frame tileid="4" duration="200"/>
   <frame tileid="5" duration="200"/>
  </animation>
 </tile>
</tileset>
"#;

const LEVEL_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="4" height="2" tilewidth="16" tileheight="16" infinite="0">
 <tileset firstgid="1" source="tilesets/terrain.tsx"/>
 <layer name="ground" width="4" height="2">
  <data encoding="csv">1,2,3,5,
0,0,2147483651,0</data>
 </layer>
 <objectgroup name="spawns">
  <object id="1" name="player" type="spawn" x="16" y="16"><point/></object>
  <object id="2" name="chest" gid="3" x="32" y="32" width="16" height="16"/>
 </objectgroup>
</map>
"#;

const LEVEL_2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="2" height="1" tilewidth="16" tileheight="16" infinite="0">
 <tileset firstgid="1" source="tilesets/terrain.tsx"/>
 <layer name="ground" width="2" height="1">
  <data encoding="base64">AQAAAAIAAAA=</data>
 </layer>
</map>
"#;

fn write_fixture() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("tilesets")).expect("tilesets dir");
    fs::write(dir.path().join("tilesets/terrain.tsx"), TERRAIN_TSX).expect("tsx");
    fs::write(dir.path().join("level1.tmx"), LEVEL_1).expect("level1");
    fs::write(dir.path().join("level2.tmx"), LEVEL_2).expect("level2");
    dir
}

#[test]
fn maps_share_external_tilesets_through_the_registry() {
    let dir = write_fixture();
    let mut registry = TilesetRegistry::new();
    let first = TiledMap::load_from_file(dir.path().join("level1.tmx"), &mut registry).unwrap();
    let second = TiledMap::load_from_file(dir.path().join("level2.tmx"), &mut registry).unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(dir.path().join("tilesets/terrain.tsx")));
    assert!(Rc::ptr_eq(&first.tilesets()[0].data, &second.tilesets()[0].data));

    let terrain = &first.tilesets()[0];
    assert_eq!(terrain.name, "terrain");
    assert_eq!(terrain.image.source, dir.path().join("tilesets").join("terrain.png"));
    assert_eq!(
        terrain.tile_data(2).unwrap().properties.get_bool("solid"),
        Some(true)
    );
}

#[test]
fn tile_layers_decode_every_encoding() {
    let dir = write_fixture();
    let mut registry = TilesetRegistry::new();
    let first = TiledMap::load_from_file(dir.path().join("level1.tmx"), &mut registry).unwrap();
    let second = TiledMap::load_from_file(dir.path().join("level2.tmx"), &mut registry).unwrap();

    let ground = first.tile_layer("ground").unwrap();
    let flipped = ground.tile(2, 1).unwrap();
    assert_eq!(flipped.gid, 3);
    assert!(flipped.flip.contains(TileFlip::HORIZONTAL));
    assert_eq!(flipped.raw(), 2147483651);
    assert!(ground.tile(0, 1).unwrap().is_empty());
    assert!(ground.tile(4, 0).is_none());
    assert_eq!(ground.animated_gids().collect::<Vec<_>>(), [5]);

    let raw: Vec<u32> = second
        .tile_layer("ground")
        .unwrap()
        .tiles()
        .iter()
        .map(|t| t.raw())
        .collect();
    assert_eq!(raw, [1, 2]);
}

#[test]
fn raw_gids_survive_a_round_trip() {
    for raw in [0u32, 1, 0x8000_0007, 0x4000_0007, 0x2000_0007, 0xE000_0001] {
        assert_eq!(Tile::from_raw(raw).raw(), raw);
    }
}

#[test]
fn objects_resolve_their_tiles() {
    let dir = write_fixture();
    let map = TiledMap::load_from_file(dir.path().join("level1.tmx"), &mut TilesetRegistry::new())
        .unwrap();
    let spawns = map.object_layer("spawns").unwrap();

    let player = spawns.object("player").unwrap();
    assert_eq!(player.class, "spawn");
    assert!(matches!(player.shape, ObjectShape::Point));

    let chest = spawns.object("chest").unwrap();
    let ObjectShape::Tile(tile) = &chest.shape else {
        panic!("chest should be a tile object");
    };
    assert_eq!(tile.local_id, 2);
    assert_eq!(chest.bounds(), Rect::new(32.0, 16.0, 16.0, 16.0));
}

#[test]
fn animation_advances_with_update() {
    let dir = write_fixture();
    let mut map = TiledMap::load_from_file(dir.path().join("level1.tmx"), &mut TilesetRegistry::new())
        .unwrap();
    map.update(0.25);
    let ground = map.tile_layer("ground").unwrap();
    assert_eq!(ground.animation_frame(5), Some(1));
    assert_eq!(ground.cell_quad(3, 0).unwrap().tex_coords[0], vec2(16.0, 16.0));
}

#[test]
fn missing_external_tileset_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orphan.tmx");
    fs::write(&path, LEVEL_2).unwrap();
    let err = TiledMap::load_from_file(&path, &mut TilesetRegistry::new()).unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }), "got {err}");
}

#[test]
fn layer_paths_reach_nested_layers() {
    let dir = write_fixture();
    let map = TiledMap::load_from_file(dir.path().join("level1.tmx"), &mut TilesetRegistry::new())
        .unwrap();
    assert!(matches!(map.layer_at_path(&["spawns"]), Some(MapLayer::Object(_))));
    assert!(map.layer_at_path(&["spawns", "player"]).is_none());
    assert!(map.find_layer("ground").is_some());
}
