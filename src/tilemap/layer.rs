use crate::error::{EngineError, Result};
use crate::properties::{parse_color, Properties};
use crate::render::{
    bounds_of, draw_quads, ellipse_points, fill_convex, stroke, transform_rect, union_rect,
    Drawable, Quad, RenderStates,
};
use crate::tilemap::raw::{RawGroup, RawLayerNode, RawObject, RawObjectGroup, RawProperties};
use crate::tilemap::tile::Tile;
use crate::tilemap::tile_layer::TileLayer;
use crate::tilemap::tileset::{tileset_index_for_gid, Tileset, TilesetData};
use macroquad::prelude::*;
use std::rc::Rc;

/// What layers need from their map while being built.
pub struct MapContext<'a> {
    /// Tilesets of the map, ordered by `firstgid`.
    pub tilesets: &'a [Tileset],
    /// Map tile size in pixels.
    pub tile_size: Vec2,
}

/// Attributes shared by every layer kind.
#[derive(Debug, Clone)]
pub struct LayerCommon {
    /// Name used by layer lookups.
    pub name: String,
    /// Invisible layers are not drawn.
    pub visible: bool,
    /// Multiplied into the layer's alpha, `[0, 1]`.
    pub opacity: f32,
    /// Drawing offset in pixels.
    pub offset: Vec2,
    /// Custom properties.
    pub properties: Properties,
}

impl LayerCommon {
    pub(crate) fn new(
        name: String,
        visible: bool,
        opacity: f32,
        offset: Vec2,
        properties: Option<RawProperties>,
    ) -> Result<Self> {
        Ok(LayerCommon {
            name,
            visible,
            opacity,
            offset,
            properties: Properties::from_raw(properties)?,
        })
    }

    fn states(&self, states: &RenderStates) -> RenderStates {
        states.translated(self.offset).with_opacity(self.opacity)
    }
}

/// Any layer of a map.
#[derive(Debug, Clone)]
pub enum MapLayer {
    /// A tile grid.
    Tile(TileLayer),
    /// Free-placed objects.
    Object(ObjectLayer),
    /// Nested layers.
    Group(GroupLayer),
}

impl MapLayer {
    /// Attributes every layer has.
    pub fn common(&self) -> &LayerCommon {
        match self {
            MapLayer::Tile(l) => &l.common,
            MapLayer::Object(l) => &l.common,
            MapLayer::Group(l) => &l.common,
        }
    }

    /// Mutable form of [`MapLayer::common`].
    pub fn common_mut(&mut self) -> &mut LayerCommon {
        match self {
            MapLayer::Tile(l) => &mut l.common,
            MapLayer::Object(l) => &mut l.common,
            MapLayer::Group(l) => &mut l.common,
        }
    }

    /// The layer name.
    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// The tile layer, if this is one.
    pub fn as_tile(&self) -> Option<&TileLayer> {
        match self {
            MapLayer::Tile(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable form of [`MapLayer::as_tile`].
    pub fn as_tile_mut(&mut self) -> Option<&mut TileLayer> {
        match self {
            MapLayer::Tile(l) => Some(l),
            _ => None,
        }
    }

    /// The object layer, if this is one.
    pub fn as_object(&self) -> Option<&ObjectLayer> {
        match self {
            MapLayer::Object(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable form of [`MapLayer::as_object`].
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectLayer> {
        match self {
            MapLayer::Object(l) => Some(l),
            _ => None,
        }
    }

    /// The group layer, if this is one.
    pub fn as_group(&self) -> Option<&GroupLayer> {
        match self {
            MapLayer::Group(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable form of [`MapLayer::as_group`].
    pub fn as_group_mut(&mut self) -> Option<&mut GroupLayer> {
        match self {
            MapLayer::Group(l) => Some(l),
            _ => None,
        }
    }

    /// Advances tile animations, recursing into groups.
    pub fn update(&mut self, dt: f32) {
        match self {
            MapLayer::Tile(l) => l.update(dt),
            MapLayer::Object(_) => {}
            MapLayer::Group(g) => g.layers.iter_mut().for_each(|l| l.update(dt)),
        }
    }
}

impl Drawable for MapLayer {
    fn position(&self) -> Vec2 {
        self.common().offset
    }

    fn global_bounds(&self) -> Rect {
        match self {
            MapLayer::Tile(l) => l.global_bounds(),
            MapLayer::Object(l) => l.global_bounds(),
            MapLayer::Group(l) => l.global_bounds(),
        }
    }

    fn draw(&self, states: &RenderStates) {
        match self {
            MapLayer::Tile(l) => l.draw(states),
            MapLayer::Object(l) => l.draw(states),
            MapLayer::Group(l) => l.draw(states),
        }
    }
}

/// Lookup of child layers, shared by the map and group layers.
pub trait LayerContainer {
    /// Direct children in document order.
    fn layers(&self) -> &[MapLayer];
    /// Mutable form of [`LayerContainer::layers`].
    fn layers_mut(&mut self) -> &mut [MapLayer];

    /// Direct child named `name`.
    fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers().iter().find(|l| l.name() == name)
    }

    /// Mutable form of [`LayerContainer::layer`].
    fn layer_mut(&mut self, name: &str) -> Option<&mut MapLayer> {
        self.layers_mut().iter_mut().find(|l| l.name() == name)
    }

    /// Direct child tile layer named `name`.
    fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.layer(name)?.as_tile()
    }

    /// Mutable form of [`LayerContainer::tile_layer`].
    fn tile_layer_mut(&mut self, name: &str) -> Option<&mut TileLayer> {
        self.layer_mut(name)?.as_tile_mut()
    }

    /// Direct child object layer named `name`.
    fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.layer(name)?.as_object()
    }

    /// Mutable form of [`LayerContainer::object_layer`].
    fn object_layer_mut(&mut self, name: &str) -> Option<&mut ObjectLayer> {
        self.layer_mut(name)?.as_object_mut()
    }

    /// Direct child group layer named `name`.
    fn group_layer(&self, name: &str) -> Option<&GroupLayer> {
        self.layer(name)?.as_group()
    }

    /// Mutable form of [`LayerContainer::group_layer`].
    fn group_layer_mut(&mut self, name: &str) -> Option<&mut GroupLayer> {
        self.layer_mut(name)?.as_group_mut()
    }

    /// Follows `path` through nested groups: every segment but the last must
    /// name a group layer.
    fn layer_at_path(&self, path: &[&str]) -> Option<&MapLayer> {
        let (last, groups) = path.split_last()?;
        let mut layers = self.layers();
        for name in groups {
            let group = layers.iter().find(|l| l.name() == *name)?.as_group()?;
            layers = group.layers.as_slice();
        }
        layers.iter().find(|l| l.name() == *last)
    }

    /// Mutable form of [`LayerContainer::layer_at_path`].
    fn layer_at_path_mut(&mut self, path: &[&str]) -> Option<&mut MapLayer> {
        let (last, groups) = path.split_last()?;
        let mut layers = self.layers_mut();
        for name in groups {
            let tmp = layers;
            let group = tmp.iter_mut().find(|l| l.name() == *name)?.as_group_mut()?;
            layers = group.layers.as_mut_slice();
        }
        layers.iter_mut().find(|l| l.name() == *last)
    }

    /// Depth-first search of the whole subtree, parents before children.
    fn find_layer(&self, name: &str) -> Option<&MapLayer> {
        find_in(self.layers(), name)
    }
}

fn find_in<'a>(layers: &'a [MapLayer], name: &str) -> Option<&'a MapLayer> {
    for layer in layers {
        if layer.name() == name {
            return Some(layer);
        }
        if let MapLayer::Group(group) = layer {
            if let Some(found) = find_in(&group.layers, name) {
                return Some(found);
            }
        }
    }
    None
}

/// Nested layers drawn in document order.
#[derive(Debug, Clone)]
pub struct GroupLayer {
    /// Shared layer attributes.
    pub common: LayerCommon,
    /// Children in document order.
    pub layers: Vec<MapLayer>,
}

impl GroupLayer {
    pub(crate) fn from_raw(raw: RawGroup, ctx: &MapContext<'_>) -> Result<Self> {
        let mut properties = Properties::new();
        let layers = build_layers(raw.children, ctx, &mut properties)?;
        Ok(GroupLayer {
            common: LayerCommon {
                name: raw.name,
                visible: raw.visible,
                opacity: raw.opacity,
                offset: vec2(raw.offsetx, raw.offsety),
                properties,
            },
            layers,
        })
    }
}

impl LayerContainer for GroupLayer {
    fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut [MapLayer] {
        &mut self.layers
    }
}

impl Drawable for GroupLayer {
    fn position(&self) -> Vec2 {
        self.common.offset
    }

    fn global_bounds(&self) -> Rect {
        let inner = self
            .layers
            .iter()
            .map(Drawable::global_bounds)
            .reduce(union_rect)
            .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
        inner.offset(self.common.offset)
    }

    fn draw(&self, states: &RenderStates) {
        if !self.common.visible {
            return;
        }
        let states = self.common.states(states);
        for layer in &self.layers {
            layer.draw(&states);
        }
    }
}

/// Turns document-ordered layer nodes into layers. A `<properties>` node
/// among them belongs to the parent and is stored into `properties`.
pub(crate) fn build_layers(
    nodes: Vec<RawLayerNode>,
    ctx: &MapContext<'_>,
    properties: &mut Properties,
) -> Result<Vec<MapLayer>> {
    let mut layers = Vec::new();
    for node in nodes {
        match node {
            RawLayerNode::Properties(p) => *properties = Properties::from_raw(Some(p))?,
            RawLayerNode::Layer(raw) => layers.push(MapLayer::Tile(TileLayer::from_raw(raw, ctx)?)),
            RawLayerNode::Objectgroup(raw) => {
                layers.push(MapLayer::Object(ObjectLayer::from_raw(raw, ctx)?))
            }
            RawLayerNode::Group(raw) => layers.push(MapLayer::Group(GroupLayer::from_raw(raw, ctx)?)),
            RawLayerNode::Imagelayer(raw) => {
                log::warn!("image layer '{}' is not supported, skipped", raw.name)
            }
            RawLayerNode::Other => {}
        }
    }
    Ok(layers)
}

/// A tile placed as an object.
#[derive(Debug, Clone)]
pub struct TileObject {
    /// The gid and flips.
    pub tile: Tile,
    /// Tileset the gid resolves to.
    pub tileset: Rc<TilesetData>,
    /// Id within `tileset`.
    pub local_id: u32,
    tex_coords: [Vec2; 4],
}

/// What an object looks like.
#[derive(Debug, Clone)]
pub enum ObjectShape {
    /// `size` box from the position.
    Rectangle,
    /// Ellipse inscribed in the `size` box.
    Ellipse,
    /// A single point.
    Point,
    /// Vertices relative to the object's position.
    Polygon(Vec<Vec2>),
    /// Open path, vertices relative to the object's position.
    Polyline(Vec<Vec2>),
    /// A tile drawn in the `size` box.
    Tile(TileObject),
}

/// One object of an object layer.
#[derive(Debug, Clone)]
pub struct MapObject {
    /// Id unique within the map.
    pub id: u32,
    /// Object name, may be empty.
    pub name: String,
    /// `class` attribute, or `type` for maps saved by older editors.
    pub class: String,
    /// Anchor in layer pixels.
    pub position: Vec2,
    /// Width and height, zero for points and paths.
    pub size: Vec2,
    /// Clockwise, in degrees, around `position`.
    pub rotation: f32,
    /// Hidden objects are not drawn.
    pub visible: bool,
    /// Custom properties.
    pub properties: Properties,
    /// Geometry.
    pub shape: ObjectShape,
}

impl MapObject {
    fn from_raw(raw: RawObject, ctx: &MapContext<'_>) -> Result<Self> {
        let mut size = vec2(raw.width, raw.height);
        let shape = if let Some(gid) = raw.gid {
            let tile = Tile::from_raw(gid);
            let ts = &ctx.tilesets[tileset_index_for_gid(ctx.tilesets, tile.gid)?];
            let local_id = ts.local_id(tile.gid);
            if size == Vec2::ZERO {
                size = vec2(ts.tile_width as f32, ts.tile_height as f32);
            }
            ObjectShape::Tile(TileObject {
                tile,
                tileset: Rc::clone(&ts.data),
                local_id,
                tex_coords: ts.tile_tex_coords(local_id, tile.flip)?,
            })
        } else if let Some(p) = raw.polygon {
            ObjectShape::Polygon(parse_points(raw.id, &p.points)?)
        } else if let Some(p) = raw.polyline {
            ObjectShape::Polyline(parse_points(raw.id, &p.points)?)
        } else if raw.ellipse.is_some() {
            ObjectShape::Ellipse
        } else if raw.point.is_some() {
            ObjectShape::Point
        } else {
            ObjectShape::Rectangle
        };

        Ok(MapObject {
            id: raw.id,
            name: raw.name,
            class: if raw.class.is_empty() { raw.kind } else { raw.class },
            position: vec2(raw.x, raw.y),
            size,
            rotation: raw.rotation,
            visible: raw.visible,
            properties: Properties::from_raw(raw.properties)?,
            shape,
        })
    }

    /// Layer-space transform: rotation around `position`.
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation.to_radians(), self.position)
    }

    /// Shape bounds before rotation, relative to `position`. Tile objects
    /// hang above their anchor.
    pub fn local_bounds(&self) -> Rect {
        match &self.shape {
            ObjectShape::Rectangle | ObjectShape::Ellipse => {
                Rect::new(0.0, 0.0, self.size.x, self.size.y)
            }
            ObjectShape::Point => Rect::new(0.0, 0.0, 0.0, 0.0),
            ObjectShape::Polygon(points) | ObjectShape::Polyline(points) => {
                bounds_of(points).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
            }
            ObjectShape::Tile(_) => Rect::new(0.0, -self.size.y, self.size.x, self.size.y),
        }
    }

    /// Layer-space axis-aligned bounds.
    pub fn bounds(&self) -> Rect {
        transform_rect(&self.matrix(), self.local_bounds())
    }

    fn draw(&self, color: Color, draw_shapes: bool, states: &RenderStates) {
        if !self.visible {
            return;
        }
        let states = states.transformed(self.matrix());
        let fill = Color::new(color.r, color.g, color.b, color.a * 0.25);
        match &self.shape {
            ObjectShape::Tile(t) => {
                let quad = Quad::new(self.local_bounds(), t.tex_coords);
                if let Some(texture) = t.tileset.texture() {
                    draw_quads(std::iter::once(&quad), Some(texture), &states);
                }
            }
            _ if !draw_shapes => {}
            ObjectShape::Rectangle => {
                let r = self.local_bounds();
                let corners = [
                    vec2(r.x, r.y),
                    vec2(r.x + r.w, r.y),
                    vec2(r.x + r.w, r.y + r.h),
                    vec2(r.x, r.y + r.h),
                ];
                fill_convex(&corners, fill, &states);
                stroke(&corners, true, 1.0, color, &states);
            }
            ObjectShape::Ellipse => {
                let points = ellipse_points(self.local_bounds(), 32);
                fill_convex(&points, fill, &states);
                stroke(&points, true, 1.0, color, &states);
            }
            ObjectShape::Point => {
                let points = ellipse_points(Rect::new(-2.0, -2.0, 4.0, 4.0), 8);
                fill_convex(&points, color, &states);
            }
            ObjectShape::Polygon(points) => stroke(points, true, 1.0, color, &states),
            ObjectShape::Polyline(points) => stroke(points, false, 1.0, color, &states),
        }
    }
}

fn parse_points(id: u32, text: &str) -> Result<Vec<Vec2>> {
    text.split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(vec2(x.parse().ok()?, y.parse().ok()?))
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| EngineError::InvalidMap(format!("object {id}: malformed points '{text}'")))
}

/// Tiled's default object layer color.
const DEFAULT_OBJECT_COLOR: Color = Color::new(0.627, 0.627, 0.643, 1.0);

/// Objects drawn over the map.
#[derive(Debug, Clone)]
pub struct ObjectLayer {
    /// Shared layer attributes.
    pub common: LayerCommon,
    /// Outline color for shapes.
    pub color: Color,
    /// Draw outlines of non-tile objects; tile objects are always drawn.
    pub draw_shapes: bool,
    objects: Vec<MapObject>,
}

impl ObjectLayer {
    pub(crate) fn from_raw(raw: RawObjectGroup, ctx: &MapContext<'_>) -> Result<Self> {
        let color = match raw.color.as_deref() {
            Some(text) => parse_color(text).ok_or_else(|| {
                EngineError::InvalidMap(format!(
                    "object layer '{}' has malformed color '{text}'",
                    raw.name
                ))
            })?,
            None => DEFAULT_OBJECT_COLOR,
        };
        let objects = raw
            .objects
            .into_iter()
            .map(|o| MapObject::from_raw(o, ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(ObjectLayer {
            common: LayerCommon::new(
                raw.name,
                raw.visible,
                raw.opacity,
                vec2(raw.offsetx, raw.offsety),
                raw.properties,
            )?,
            color,
            draw_shapes: true,
            objects,
        })
    }

    /// Objects in document order.
    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    /// Mutable form of [`ObjectLayer::objects`].
    pub fn objects_mut(&mut self) -> &mut [MapObject] {
        &mut self.objects
    }

    /// First object named `name`.
    pub fn object(&self, name: &str) -> Option<&MapObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Objects whose class is `class`.
    pub fn objects_of_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a MapObject> {
        self.objects.iter().filter(move |o| o.class == class)
    }

    /// Layer-space bounds of every rectangle object, e.g. for collision.
    pub fn rectangles(&self) -> Vec<Rect> {
        self.objects
            .iter()
            .filter(|o| matches!(o.shape, ObjectShape::Rectangle))
            .map(|o| o.bounds().offset(self.common.offset))
            .collect()
    }
}

impl Drawable for ObjectLayer {
    fn position(&self) -> Vec2 {
        self.common.offset
    }

    fn global_bounds(&self) -> Rect {
        self.objects
            .iter()
            .map(MapObject::bounds)
            .reduce(union_rect)
            .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
            .offset(self.common.offset)
    }

    fn draw(&self, states: &RenderStates) {
        if !self.common.visible {
            return;
        }
        let states = self.common.states(states);
        for object in &self.objects {
            object.draw(self.color, self.draw_shapes, &states);
        }
    }
}
