use crate::error::{EngineError, Result};
use crate::render::{draw_quads, Drawable, Quad, RenderStates};
use crate::tilemap::layer::{LayerCommon, MapContext};
use crate::tilemap::raw::{RawData, RawTileLayer};
use crate::tilemap::spatial::{cell_to_chunk, chunk_in_range, visible_chunk_range, ChunkCoord};
use crate::tilemap::tile::Tile;
use crate::tilemap::tileset::{tileset_index_for_gid, AnimationFrame, Tileset, TilesetData};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use macroquad::prelude::*;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Which vertex batch a quad lives in: one per (tileset, chunk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchKey {
    /// Index of the tileset in the map's tileset list.
    pub tileset: usize,
    /// 32x32-cell chunk the quad's cell is in.
    pub chunk: ChunkCoord,
}

/// Quads sharing one tileset texture.
#[derive(Debug, Clone)]
pub struct TileBatch {
    /// Tileset whose texture the quads sample.
    pub tileset: Rc<TilesetData>,
    /// One quad per placed tile.
    pub quads: Vec<Quad>,
}

#[derive(Debug, Clone, Copy)]
struct QuadRef {
    key: BatchKey,
    index: usize,
}

#[derive(Debug, Clone)]
struct AnimatedTile {
    tileset: Rc<TilesetData>,
    frames: Vec<AnimationFrame>,
    frame: usize,
    elapsed_ms: f32,
    /// Cells (row-major indices) currently showing this gid.
    cells: Vec<usize>,
}

/// A dense, row-major grid of tiles.
#[derive(Debug, Clone)]
pub struct TileLayer {
    /// Shared layer attributes.
    pub common: LayerCommon,
    width: u32,
    height: u32,
    /// `width * height`
    cell_count: usize,
    tile_size: Vec2,
    tiles: Vec<Tile>,
    batches: BTreeMap<BatchKey, TileBatch>,
    cells: Vec<Option<QuadRef>>,
    animated: BTreeMap<u32, AnimatedTile>,
}

impl TileLayer {
    /// An empty `width` x `height` layer to be filled with [`add_tile`](Self::add_tile).
    /// Fails when the grid has more cells than can be indexed.
    pub fn new(common: LayerCommon, width: u32, height: u32, tile_size: Vec2) -> Result<Self> {
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).map_err(|_| {
            EngineError::InvalidMap(format!(
                "layer '{}' is too large ({width}x{height} tiles)",
                common.name
            ))
        })?;
        Ok(TileLayer {
            common,
            width,
            height,
            cell_count,
            tile_size,
            tiles: Vec::new(),
            batches: BTreeMap::new(),
            cells: Vec::new(),
            animated: BTreeMap::new(),
        })
    }

    pub(crate) fn from_raw(raw: RawTileLayer, ctx: &MapContext<'_>) -> Result<Self> {
        let common = LayerCommon::new(
            raw.name,
            raw.visible,
            raw.opacity,
            vec2(raw.offsetx, raw.offsety),
            raw.properties,
        )?;
        let mut layer = TileLayer::new(common, raw.width, raw.height, ctx.tile_size)?;
        let gids = decode_data(&layer.common.name, raw.data)?;
        if gids.len() != layer.cell_count {
            return Err(EngineError::InvalidLayerSize {
                layer: layer.common.name,
                expected: layer.cell_count,
                found: gids.len(),
            });
        }

        layer.tiles.reserve_exact(gids.len());
        layer.cells.reserve_exact(gids.len());
        for gid in gids {
            layer.add_tile(gid, ctx.tilesets)?;
        }
        Ok(layer)
    }

    /// Appends the next cell in row-major order. `raw_gid` still carries its
    /// flip bits; they are split off before storing.
    pub fn add_tile(&mut self, raw_gid: u32, tilesets: &[Tileset]) -> Result<()> {
        let index = self.tiles.len();
        if index >= self.cell_count {
            return Err(EngineError::InvalidLayerSize {
                layer: self.common.name.clone(),
                expected: self.cell_count,
                found: index + 1,
            });
        }
        let tile = Tile::from_raw(raw_gid);
        self.tiles.push(tile);
        self.cells.push(None);
        if tile.is_empty() {
            return Ok(());
        }

        let ts_index = tileset_index_for_gid(tilesets, tile.gid)?;
        let ts = &tilesets[ts_index];
        let local = ts.local_id(tile.gid);
        let animation = ts.animation(local);
        let shown = animation.as_ref().map_or(local, |frames| frames[0].tile_id);

        let col = (index % self.width as usize) as u32;
        let row = (index / self.width as usize) as u32;
        let (tw, th) = (ts.tile_width as f32, ts.tile_height as f32);
        // Tiles taller than the grid grow upwards from the cell's bottom-left.
        let origin = vec2(
            col as f32 * self.tile_size.x,
            (row as f32 + 1.0) * self.tile_size.y - th,
        );
        let quad = Quad::new(
            Rect::new(origin.x, origin.y, tw, th),
            ts.tile_tex_coords(shown, tile.flip)?,
        );

        let key = BatchKey {
            tileset: ts_index,
            chunk: cell_to_chunk(col, row),
        };
        let batch = self.batches.entry(key).or_insert_with(|| TileBatch {
            tileset: Rc::clone(&ts.data),
            quads: Vec::new(),
        });
        batch.quads.push(quad);
        self.cells[index] = Some(QuadRef {
            key,
            index: batch.quads.len() - 1,
        });

        if let Some(frames) = animation {
            self.animated
                .entry(tile.gid)
                .or_insert_with(|| AnimatedTile {
                    tileset: Rc::clone(&ts.data),
                    frames,
                    frame: 0,
                    elapsed_ms: 0.0,
                    cells: Vec::new(),
                })
                .cells
                .push(index);
        }
        Ok(())
    }

    /// The layer name.
    pub fn name(&self) -> &str {
        &self.common.name
    }

    /// Columns in the grid.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Every cell, row-major; empty cells have gid 0.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The tile at a cell, `None` outside the grid.
    pub fn tile(&self, col: u32, row: u32) -> Option<Tile> {
        self.tiles.get(self.cell_index(col, row)?).copied()
    }

    fn cell_index(&self, col: u32, row: u32) -> Option<usize> {
        if col >= self.width || row >= self.height {
            return None;
        }
        // below cell_count, which fits in usize
        Some(row as usize * self.width as usize + col as usize)
    }

    /// Batches ordered by tileset, then chunk.
    pub fn batches(&self) -> impl Iterator<Item = (&BatchKey, &TileBatch)> {
        self.batches.iter()
    }

    /// The quad drawn for a cell, `None` for empty cells.
    pub fn cell_quad(&self, col: u32, row: u32) -> Option<&Quad> {
        let r = self.cells.get(self.cell_index(col, row)?)?.as_ref()?;
        self.batches.get(&r.key)?.quads.get(r.index)
    }

    /// Gids of the animated tiles placed in this layer.
    pub fn animated_gids(&self) -> impl Iterator<Item = u32> + '_ {
        self.animated.keys().copied()
    }

    /// Current frame index of an animated gid.
    pub fn animation_frame(&self, gid: u32) -> Option<usize> {
        self.animated.get(&gid).map(|a| a.frame)
    }

    /// Advances animation clocks by `dt` seconds and rewrites the texture
    /// coordinates of cells whose frame changed.
    /// Non-finite or negative `dt` is ignored.
    pub fn update(&mut self, dt: f32) {
        let step_ms = dt * 1000.0;
        if !step_ms.is_finite() || step_ms < 0.0 {
            log::trace!("layer '{}' ignores dt {dt}", self.common.name);
            return;
        }
        let TileLayer {
            tiles,
            batches,
            cells,
            animated,
            ..
        } = self;

        for anim in animated.values_mut() {
            anim.elapsed_ms += step_ms;
            // drop whole cycles beyond the first so catching up stays bounded
            let cycle: f32 = anim.frames.iter().map(|f| f.duration_ms as f32).sum();
            if cycle > 0.0 && anim.elapsed_ms >= 2.0 * cycle {
                anim.elapsed_ms = cycle + anim.elapsed_ms % cycle;
            }
            let start = anim.frame;
            loop {
                let duration = anim.frames[anim.frame].duration_ms as f32;
                if anim.elapsed_ms < duration {
                    break;
                }
                anim.elapsed_ms -= duration;
                anim.frame = (anim.frame + 1) % anim.frames.len();
                // a zero-length frame is still shown for one update
                if anim.frames[anim.frame].duration_ms == 0 {
                    break;
                }
            }
            if anim.frame == start {
                continue;
            }

            let tile_id = anim.frames[anim.frame].tile_id;
            for &cell in &anim.cells {
                let Some(r) = cells[cell] else { continue };
                let Some(batch) = batches.get_mut(&r.key) else { continue };
                // frame ids were range-checked when the tileset loaded
                if let Ok(tex_coords) = anim.tileset.tile_tex_coords(tile_id, tiles[cell].flip) {
                    batch.quads[r.index].tex_coords = tex_coords;
                }
            }
        }
    }

    /// Shifts the layer offset.
    pub fn move_by(&mut self, offset: Vec2) {
        self.common.offset += offset;
    }
}

impl Drawable for TileLayer {
    fn position(&self) -> Vec2 {
        self.common.offset
    }

    fn global_bounds(&self) -> Rect {
        Rect::new(
            self.common.offset.x,
            self.common.offset.y,
            self.width as f32 * self.tile_size.x,
            self.height as f32 * self.tile_size.y,
        )
    }

    fn draw(&self, states: &RenderStates) {
        if !self.common.visible {
            return;
        }
        let states = states
            .translated(self.common.offset)
            .with_opacity(self.common.opacity);
        let range = states
            .local_view()
            .map(|view| visible_chunk_range(view, self.tile_size));

        for (key, batch) in &self.batches {
            if let Some(range) = range {
                if !chunk_in_range(key.chunk, range) {
                    continue;
                }
            }
            let Some(texture) = batch.tileset.texture() else {
                log::trace!("tileset '{}' has no texture yet", batch.tileset.name);
                continue;
            };
            draw_quads(&batch.quads, Some(texture), &states);
        }
    }
}

fn decode_data(layer: &str, data: Option<RawData>) -> Result<Vec<u32>> {
    let Some(data) = data else {
        return Ok(Vec::new());
    };
    let malformed = |reason: String| EngineError::InvalidLayerData {
        layer: layer.to_owned(),
        reason,
    };
    if !data.chunks.is_empty() {
        return Err(malformed("chunked (infinite map) data is not supported".to_owned()));
    }
    if data.compression.is_some() {
        return Err(EngineError::UnsupportedEncoding {
            layer: layer.to_owned(),
            encoding: data.encoding,
            compression: data.compression,
        });
    }

    match data.encoding.as_deref() {
        None => Ok(data.tiles.iter().map(|t| t.gid).collect()),
        Some("csv") => data
            .text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| malformed(format!("'{s}' is not a tile gid")))
            })
            .collect(),
        Some("base64") => {
            let cleaned: String = data.text.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD
                .decode(cleaned)
                .map_err(|e| malformed(e.to_string()))?;
            if bytes.len() % 4 != 0 {
                return Err(malformed(format!(
                    "{} bytes is not a whole number of gids",
                    bytes.len()
                )));
            }
            Ok(bytes
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect())
        }
        Some(_) => Err(EngineError::UnsupportedEncoding {
            layer: layer.to_owned(),
            encoding: data.encoding,
            compression: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::raw::{self, RawTileset};
    use crate::tilemap::tile::{TileFlip, FLIPPED_HORIZONTALLY};
    use std::path::Path;

    fn tileset(xml: &str, firstgid: u32) -> Tileset {
        let raw: RawTileset = raw::decode(xml, "inline").expect("tileset decodes");
        Tileset::new(
            Rc::new(TilesetData::from_raw(raw, Path::new("")).expect("valid tileset")),
            firstgid,
        )
    }

    fn tilesets() -> Vec<Tileset> {
        vec![
            tileset(
                r#"<tileset name="a" tilewidth="8" tileheight="8" tilecount="4" columns="2">
 <image source="a.png" width="16" height="16"/>
 <tile id="1"><animation>
  <frame tileid="1" duration="100"/><frame tileid="2" duration="50"/><frame tileid="3" duration="0"/>
 </animation></tile>
</tileset>"#,
                1,
            ),
            tileset(
                r#"<tileset name="b" tilewidth="8" tileheight="16" tilecount="2" columns="2">
 <image source="b.png" width="16" height="16"/>
</tileset>"#,
                5,
            ),
        ]
    }

    fn layer_xml(data: &str, w: u32, h: u32) -> RawTileLayer {
        let xml = format!(r#"<layer name="ground" width="{w}" height="{h}" opacity="0.5">{data}</layer>"#);
        raw::decode(&xml, "inline").expect("layer decodes")
    }

    fn build(data: &str, w: u32, h: u32, sets: &[Tileset]) -> Result<TileLayer> {
        let ctx = MapContext {
            tilesets: sets,
            tile_size: vec2(8.0, 8.0),
        };
        TileLayer::from_raw(layer_xml(data, w, h), &ctx)
    }

    #[test]
    fn csv_grid_is_row_major() {
        let sets = tilesets();
        let layer = build(r#"<data encoding="csv">
1,0,3,
0,5,0
</data>"#, 3, 2, &sets)
        .expect("layer builds");

        assert_eq!(layer.tile(0, 0).map(|t| t.gid), Some(1));
        assert_eq!(layer.tile(2, 0).map(|t| t.gid), Some(3));
        assert_eq!(layer.tile(1, 1).map(|t| t.gid), Some(5));
        assert!(layer.tile(1, 0).map_or(false, Tile::is_empty));
        assert_eq!(layer.tile(3, 0), None);
        assert_eq!(layer.common.opacity, 0.5);
    }

    #[test]
    fn one_batch_per_tileset() {
        let sets = tilesets();
        let layer = build(r#"<data encoding="csv">1,3,5,6</data>"#, 4, 1, &sets).unwrap();
        let keys: Vec<usize> = layer.batches().map(|(k, _)| k.tileset).collect();
        assert_eq!(keys, [0, 1]);
        let counts: Vec<usize> = layer.batches().map(|(_, b)| b.quads.len()).collect();
        assert_eq!(counts, [2, 2]);
    }

    #[test]
    fn tall_tiles_anchor_bottom_left() {
        let sets = tilesets();
        let layer = build(r#"<data encoding="csv">0,0,0,5</data>"#, 2, 2, &sets).unwrap();
        let quad = layer.cell_quad(1, 1).expect("cell has a quad");
        assert_eq!(quad.bounds(), Rect::new(8.0, 0.0, 8.0, 16.0));
    }

    #[test]
    fn flip_bits_reach_texture_coordinates() {
        let sets = tilesets();
        let raw = FLIPPED_HORIZONTALLY | 3;
        let layer = build(&format!(r#"<data encoding="csv">{raw}</data>"#), 1, 1, &sets).unwrap();
        let tile = layer.tile(0, 0).unwrap();
        assert_eq!(tile.flip, TileFlip::HORIZONTAL);
        assert_eq!(tile.raw(), raw);
        let quad = layer.cell_quad(0, 0).unwrap();
        // local id 2 sits at (0, 8); the horizontal flip swaps left and right
        assert_eq!(quad.tex_coords[0], vec2(8.0, 8.0));
        assert_eq!(quad.tex_coords[1], vec2(0.0, 8.0));
    }

    #[test]
    fn xml_and_base64_encodings() {
        let sets = tilesets();
        let xml = build(r#"<data><tile gid="2"/><tile/></data>"#, 2, 1, &sets).unwrap();
        assert_eq!(xml.tiles().iter().map(|t| t.gid).collect::<Vec<_>>(), [2, 0]);

        // [5, 0] as little-endian u32s
        let b64 = build(r#"<data encoding="base64">
   BQAAAAAAAAA=
</data>"#, 2, 1, &sets)
        .unwrap();
        assert_eq!(b64.tiles().iter().map(|t| t.gid).collect::<Vec<_>>(), [5, 0]);
    }

    #[test]
    fn rejects_bad_data() {
        let sets = tilesets();
        let err = build(r#"<data encoding="csv">1,2,3</data>"#, 2, 2, &sets).err().unwrap();
        assert!(matches!(err, EngineError::InvalidLayerSize { expected: 4, found: 3, .. }));

        let err = build(r#"<data encoding="csv">99</data>"#, 1, 1, &sets).err().unwrap();
        assert!(matches!(err, EngineError::TileNotFound(99)));

        let err = build(r#"<data encoding="base64" compression="zlib">eJw=</data>"#, 1, 1, &sets)
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::UnsupportedEncoding { .. }));

        let err = build(r#"<data encoding="csv">1,x</data>"#, 2, 1, &sets).err().unwrap();
        assert!(matches!(err, EngineError::InvalidLayerData { .. }));
    }

    #[test]
    fn animation_rewrites_only_animated_cells() {
        let sets = tilesets();
        let mut layer = build(r#"<data encoding="csv">2,1,2</data>"#, 3, 1, &sets).unwrap();
        assert_eq!(layer.animated_gids().collect::<Vec<_>>(), [2]);

        let still = *layer.cell_quad(1, 0).unwrap();
        let frame1 = sets[0].tile_tex_coords(1, TileFlip::empty()).unwrap();
        let frame2 = sets[0].tile_tex_coords(2, TileFlip::empty()).unwrap();
        assert_eq!(layer.cell_quad(0, 0).unwrap().tex_coords, frame1);

        layer.update(0.05);
        assert_eq!(layer.animation_frame(2), Some(0));
        assert_eq!(layer.cell_quad(0, 0).unwrap().tex_coords, frame1);

        layer.update(0.06);
        assert_eq!(layer.animation_frame(2), Some(1));
        assert_eq!(layer.cell_quad(0, 0).unwrap().tex_coords, frame2);
        assert_eq!(layer.cell_quad(2, 0).unwrap().tex_coords, frame2);
        assert_eq!(*layer.cell_quad(1, 0).unwrap(), still);
    }

    #[test]
    fn zero_length_frame_advances_once_per_update() {
        let sets = tilesets();
        let mut layer = build(r#"<data encoding="csv">2</data>"#, 1, 1, &sets).unwrap();
        layer.update(0.15); // 100ms + 50ms -> lands on the 0ms frame
        assert_eq!(layer.animation_frame(2), Some(2));
        layer.update(0.0);
        assert_eq!(layer.animation_frame(2), Some(0));
    }

    #[test]
    fn huge_or_broken_dt_does_not_stall_animation() {
        let sets = tilesets();
        let mut layer = build(r#"<data encoding="csv">2</data>"#, 1, 1, &sets).unwrap();
        // 1e10 ms is far past where subtracting a 100 ms frame changes an f32
        layer.update(1.0e7);
        assert_eq!(layer.animation_frame(2), Some(2));

        for dt in [f32::NAN, f32::INFINITY, f32::MAX, -1.0] {
            layer.update(dt);
            assert_eq!(layer.animation_frame(2), Some(2));
        }
        layer.update(0.0);
        assert_eq!(layer.animation_frame(2), Some(1));
    }

    #[test]
    fn oversized_grid_is_rejected_without_allocating() {
        let sets = tilesets();
        let err = build(r#"<data encoding="csv"></data>"#, 65536, 65536, &sets)
            .err()
            .unwrap();
        match err {
            EngineError::InvalidLayerSize { expected, found, .. } => {
                assert_eq!(expected as u64, 65536 * 65536);
                assert_eq!(found, 0);
            }
            // 32-bit targets cannot index the grid at all
            EngineError::InvalidMap(_) => {}
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn bounds_follow_offset() {
        let sets = tilesets();
        let mut layer = build(r#"<data encoding="csv">0,0</data>"#, 2, 1, &sets).unwrap();
        layer.move_by(vec2(4.0, -2.0));
        assert_eq!(layer.global_bounds(), Rect::new(4.0, -2.0, 16.0, 8.0));
        assert_eq!(layer.position(), vec2(4.0, -2.0));
    }
}
