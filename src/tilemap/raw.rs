//! Serde mirrors of the TMX/TSX elements.
//!
//! These are decoded with quick-xml and then normalized into the runtime
//! model; nothing outside `tilemap` sees them.

use crate::error::{EngineError, Result};
use serde::Deserialize;

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(xml: &str, origin: &str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|source| EngineError::FileParse {
        origin: origin.to_owned(),
        source,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMap {
    #[serde(rename = "@orientation", default)]
    pub orientation: Option<String>,
    #[serde(rename = "@width")]
    pub width: u32,
    #[serde(rename = "@height")]
    pub height: u32,
    #[serde(rename = "@tilewidth")]
    pub tilewidth: u32,
    #[serde(rename = "@tileheight")]
    pub tileheight: u32,
    #[serde(rename = "@infinite", default)]
    pub infinite: bool,
    #[serde(rename = "$value", default)]
    pub children: Vec<RawMapNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RawMapNode {
    Properties(RawProperties),
    Tileset(RawTileset),
    Layer(RawTileLayer),
    Objectgroup(RawObjectGroup),
    Group(RawGroup),
    Imagelayer(RawNamed),
    #[serde(other)]
    Other,
}

/// Children of a `<group>`: the map children minus tilesets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RawLayerNode {
    Properties(RawProperties),
    Layer(RawTileLayer),
    Objectgroup(RawObjectGroup),
    Group(RawGroup),
    Imagelayer(RawNamed),
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProperties {
    #[serde(rename = "property", default)]
    pub items: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProperty {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    #[serde(rename = "@propertytype", default)]
    pub property_type: Option<String>,
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: Option<String>,
}

/// Used for elements we only report by name.
#[derive(Debug, Deserialize)]
pub(crate) struct RawNamed {
    #[serde(rename = "@name", default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTileset {
    #[serde(rename = "@firstgid", default)]
    pub firstgid: Option<u32>,
    #[serde(rename = "@source", default)]
    pub source: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@tilewidth", default)]
    pub tilewidth: u32,
    #[serde(rename = "@tileheight", default)]
    pub tileheight: u32,
    #[serde(rename = "@tilecount", default)]
    pub tilecount: u32,
    #[serde(rename = "@columns", default)]
    pub columns: u32,
    #[serde(rename = "@margin", default)]
    pub margin: u32,
    #[serde(rename = "@spacing", default)]
    pub spacing: u32,
    #[serde(default)]
    pub image: Option<RawImage>,
    #[serde(default)]
    pub properties: Option<RawProperties>,
    #[serde(rename = "tile", default)]
    pub tiles: Vec<RawTile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    #[serde(rename = "@source")]
    pub source: String,
    #[serde(rename = "@width", default)]
    pub width: Option<u32>,
    #[serde(rename = "@height", default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTile {
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(default)]
    pub properties: Option<RawProperties>,
    #[serde(default)]
    pub animation: Option<RawAnimation>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAnimation {
    #[serde(rename = "frame", default)]
    pub frames: Vec<RawFrame>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    #[serde(rename = "@tileid")]
    pub tileid: u32,
    #[serde(rename = "@duration")]
    pub duration: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTileLayer {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@width")]
    pub width: u32,
    #[serde(rename = "@height")]
    pub height: u32,
    #[serde(rename = "@visible", default = "default_true")]
    pub visible: bool,
    #[serde(rename = "@opacity", default = "one")]
    pub opacity: f32,
    #[serde(rename = "@offsetx", default)]
    pub offsetx: f32,
    #[serde(rename = "@offsety", default)]
    pub offsety: f32,
    #[serde(default)]
    pub properties: Option<RawProperties>,
    #[serde(default)]
    pub data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawData {
    #[serde(rename = "@encoding", default)]
    pub encoding: Option<String>,
    #[serde(rename = "@compression", default)]
    pub compression: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
    #[serde(rename = "tile", default)]
    pub tiles: Vec<RawDataTile>,
    #[serde(rename = "chunk", default)]
    pub chunks: Vec<RawNamed>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDataTile {
    #[serde(rename = "@gid", default)]
    pub gid: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObjectGroup {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@color", default)]
    pub color: Option<String>,
    #[serde(rename = "@visible", default = "default_true")]
    pub visible: bool,
    #[serde(rename = "@opacity", default = "one")]
    pub opacity: f32,
    #[serde(rename = "@offsetx", default)]
    pub offsetx: f32,
    #[serde(rename = "@offsety", default)]
    pub offsety: f32,
    #[serde(default)]
    pub properties: Option<RawProperties>,
    #[serde(rename = "object", default)]
    pub objects: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObject {
    #[serde(rename = "@id", default)]
    pub id: u32,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "@class", default)]
    pub class: String,
    #[serde(rename = "@x", default)]
    pub x: f32,
    #[serde(rename = "@y", default)]
    pub y: f32,
    #[serde(rename = "@width", default)]
    pub width: f32,
    #[serde(rename = "@height", default)]
    pub height: f32,
    #[serde(rename = "@rotation", default)]
    pub rotation: f32,
    #[serde(rename = "@gid", default)]
    pub gid: Option<u32>,
    #[serde(rename = "@visible", default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub properties: Option<RawProperties>,
    #[serde(default)]
    pub ellipse: Option<RawMarker>,
    #[serde(default)]
    pub point: Option<RawMarker>,
    #[serde(default)]
    pub polygon: Option<RawPoints>,
    #[serde(default)]
    pub polyline: Option<RawPoints>,
}

/// Empty marker element such as `<ellipse/>` or `<point/>`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMarker {}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPoints {
    #[serde(rename = "@points")]
    pub points: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGroup {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@visible", default = "default_true")]
    pub visible: bool,
    #[serde(rename = "@opacity", default = "one")]
    pub opacity: f32,
    #[serde(rename = "@offsetx", default)]
    pub offsetx: f32,
    #[serde(rename = "@offsety", default)]
    pub offsety: f32,
    #[serde(rename = "$value", default)]
    pub children: Vec<RawLayerNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_layer_children_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="2" height="1" tilewidth="8" tileheight="8" infinite="0">
 <properties>
  <property name="theme" value="cave"/>
 </properties>
 <objectgroup name="first"/>
 <layer name="second" width="2" height="1">
  <data encoding="csv">0,0</data>
 </layer>
 <editorsettings><export format="tmx"/></editorsettings>
 <group name="third"><layer name="inner" width="2" height="1"><data encoding="csv">0,0</data></layer></group>
</map>"#;
        let map: RawMap = decode(xml, "inline").expect("map decodes");
        let names: Vec<&str> = map
            .children
            .iter()
            .filter_map(|c| match c {
                RawMapNode::Layer(l) => Some(l.name.as_str()),
                RawMapNode::Objectgroup(o) => Some(o.name.as_str()),
                RawMapNode::Group(g) => Some(g.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert!(!map.infinite);
    }

    #[test]
    fn decodes_tileset_tiles_and_animation() {
        let xml = r#"<tileset name="t" tilewidth="16" tileheight="16" tilecount="4" columns="2">
 <image source="tiles.png" width="32" height="32"/>
 <tile id="1">
  <properties><property name="solid" type="bool" value="true"/></properties>
  <animation><frame tileid="1" duration="100"/><frame tileid="2" duration="150"/></animation>
 </tile>
</tileset>"#;
        let ts: RawTileset = decode(xml, "inline").expect("tileset decodes");
        assert_eq!(ts.tilecount, 4);
        assert_eq!(ts.image.as_ref().map(|i| i.source.as_str()), Some("tiles.png"));
        assert_eq!(ts.tiles.len(), 1);
        let frames = &ts.tiles[0].animation.as_ref().expect("animation").frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].duration, 150);
    }
}
