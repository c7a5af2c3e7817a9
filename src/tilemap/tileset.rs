use crate::config::TextureSettings;
use crate::error::{EngineError, Result};
use crate::properties::Properties;
use crate::tilemap::raw::{self, RawTileset};
use crate::tilemap::tile::TileFlip;
use anyhow::Context;
use macroquad::prelude::*;
use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One step of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Tileset-local id shown during this frame.
    pub tile_id: u32,
    /// How long the frame stays, in milliseconds.
    pub duration_ms: u32,
}

/// Per-tile metadata of a tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    /// Tileset-local id.
    pub id: u32,
    /// Custom properties of the tile.
    pub properties: Properties,
    /// Frames, when the tile is animated.
    pub animation: Option<Vec<AnimationFrame>>,
}

impl TileData {
    fn plain(id: u32) -> Self {
        TileData {
            id,
            properties: Properties::new(),
            animation: None,
        }
    }
}

/// The image a tileset is cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetImage {
    /// Resolved against the directory of the declaring file.
    pub source: PathBuf,
    /// Width declared in the file.
    pub width: Option<u32>,
    /// Height declared in the file.
    pub height: Option<u32>,
}

/// Tileset geometry, image and per-tile metadata, shared by every map that
/// references it.
pub struct TilesetData {
    /// Tileset name.
    pub name: String,
    /// Width of one tile in pixels.
    pub tile_width: u32,
    /// Height of one tile in pixels.
    pub tile_height: u32,
    /// Number of tiles; local ids are `0..tile_count`.
    pub tile_count: u32,
    /// Tiles per image row.
    pub columns: u32,
    /// Pixels around the whole grid of tiles.
    pub margin: u32,
    /// Pixels between neighboring tiles.
    pub spacing: u32,
    /// The source image.
    pub image: TilesetImage,
    /// Custom properties of the tileset.
    pub properties: Properties,
    /// `None` for tilesets embedded in a map.
    pub source: Option<PathBuf>,
    tiles: RefCell<BTreeMap<u32, Rc<TileData>>>,
    texture: OnceCell<Texture2D>,
}

impl fmt::Debug for TilesetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TilesetData")
            .field("name", &self.name)
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("tile_count", &self.tile_count)
            .field("columns", &self.columns)
            .field("image", &self.image.source)
            .field("texture_loaded", &self.texture.get().is_some())
            .finish()
    }
}

impl TilesetData {
    /// Loads an external `.tsx` file. Image paths resolve against its directory.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawTileset = raw::decode(&txt, &path.display().to_string())?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut data = Self::from_raw(raw, base_dir)?;
        data.source = Some(path.to_path_buf());
        Ok(data)
    }

    pub(crate) fn from_raw(raw: RawTileset, base_dir: &Path) -> Result<Self> {
        let image = raw.image.ok_or_else(|| {
            EngineError::InvalidMap(format!(
                "tileset '{}' has no image (image collections are not supported)",
                raw.name
            ))
        })?;
        if raw.columns == 0 || raw.tilewidth == 0 || raw.tileheight == 0 {
            return Err(EngineError::InvalidMap(format!(
                "tileset '{}' has an empty tile grid",
                raw.name
            )));
        }

        let check_id = |id: u32| {
            if id < raw.tilecount {
                Ok(id)
            } else {
                Err(EngineError::InvalidTileId {
                    tileset: raw.name.clone(),
                    id,
                    tile_count: raw.tilecount,
                })
            }
        };

        let mut tiles = BTreeMap::new();
        for tile in raw.tiles {
            let id = check_id(tile.id)?;
            let animation = match tile.animation {
                Some(anim) if !anim.frames.is_empty() => Some(
                    anim.frames
                        .into_iter()
                        .map(|f| {
                            Ok(AnimationFrame {
                                tile_id: check_id(f.tileid)?,
                                duration_ms: f.duration,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                ),
                _ => None,
            };
            tiles.insert(
                id,
                Rc::new(TileData {
                    id,
                    properties: Properties::from_raw(tile.properties)?,
                    animation,
                }),
            );
        }

        Ok(TilesetData {
            name: raw.name,
            tile_width: raw.tilewidth,
            tile_height: raw.tileheight,
            tile_count: raw.tilecount,
            columns: raw.columns,
            margin: raw.margin,
            spacing: raw.spacing,
            image: TilesetImage {
                source: base_dir.join(&image.source),
                width: image.width,
                height: image.height,
            },
            properties: Properties::from_raw(raw.properties)?,
            source: None,
            tiles: RefCell::new(tiles),
            texture: OnceCell::new(),
        })
    }

    fn check_id(&self, id: u32) -> Result<()> {
        if id < self.tile_count {
            Ok(())
        } else {
            Err(EngineError::InvalidTileId {
                tileset: self.name.clone(),
                id,
                tile_count: self.tile_count,
            })
        }
    }

    /// Source rectangle of tile `id`, in image pixels.
    pub fn tile_texture_rect(&self, id: u32) -> Result<Rect> {
        self.check_id(id)?;
        let x = (id % self.columns) * (self.tile_width + self.spacing) + self.margin;
        let y = (id / self.columns) * (self.tile_height + self.spacing) + self.margin;
        Ok(Rect::new(
            x as f32,
            y as f32,
            self.tile_width as f32,
            self.tile_height as f32,
        ))
    }

    /// Corner texture coordinates (TL, TR, BR, BL) in image pixels, after `flip`.
    pub fn tile_tex_coords(&self, id: u32, flip: TileFlip) -> Result<[Vec2; 4]> {
        let r = self.tile_texture_rect(id)?;
        let corners = [
            vec2(r.x, r.y),
            vec2(r.x + r.w, r.y),
            vec2(r.x + r.w, r.y + r.h),
            vec2(r.x, r.y + r.h),
        ];
        Ok(apply_flip(corners, flip))
    }

    /// Metadata of tile `id`; tiles the file does not describe get an empty
    /// entry, created once.
    pub fn tile_data(&self, id: u32) -> Result<Rc<TileData>> {
        self.check_id(id)?;
        let mut tiles = self.tiles.borrow_mut();
        Ok(Rc::clone(
            tiles.entry(id).or_insert_with(|| Rc::new(TileData::plain(id))),
        ))
    }

    pub(crate) fn animation(&self, id: u32) -> Option<Vec<AnimationFrame>> {
        self.tiles.borrow().get(&id).and_then(|t| t.animation.clone())
    }

    /// The loaded texture, if any.
    pub fn texture(&self) -> Option<&Texture2D> {
        self.texture.get()
    }

    /// Image size from the tileset file, else from the loaded texture.
    pub fn image_size(&self) -> Option<Vec2> {
        match (self.image.width, self.image.height) {
            (Some(w), Some(h)) => Some(vec2(w as f32, h as f32)),
            _ => self.texture().map(|t| vec2(t.width(), t.height())),
        }
    }

    /// Loads the image once; later calls do nothing.
    pub async fn load_texture(&self, settings: &TextureSettings) -> anyhow::Result<()> {
        if self.texture.get().is_some() {
            return Ok(());
        }
        let path = self
            .image
            .source
            .to_str()
            .with_context(|| format!("Non UTF-8 image path {}", self.image.source.display()))?;
        let tex: Texture2D = macroquad::texture::load_texture(path)
            .await
            .with_context(|| format!("Loading texture {}", path))?;
        tex.set_filter(settings.filter.into());
        log::debug!("loaded texture {} for tileset '{}'", path, self.name);
        let _ = self.texture.set(tex);
        Ok(())
    }
}

/// Vertical flip, then horizontal, then diagonal; the diagonal swaps TL/BR
/// for the pure 90/270 rotations and TR/BL otherwise.
pub fn apply_flip(mut c: [Vec2; 4], flip: TileFlip) -> [Vec2; 4] {
    if flip.contains(TileFlip::VERTICAL) {
        let top = c[0].y;
        c[0].y = c[3].y;
        c[1].y = c[2].y;
        c[3].y = top;
        c[2].y = top;
    }
    if flip.contains(TileFlip::HORIZONTAL) {
        let left = c[0].x;
        c[0].x = c[1].x;
        c[1].x = left;
        c[3].x = c[0].x;
        c[2].x = c[1].x;
    }
    if flip.contains(TileFlip::DIAGONAL) {
        let (i1, i2) = if flip == TileFlip::ROTATE_90 || flip == TileFlip::ROTATE_270 {
            (0, 2)
        } else {
            (1, 3)
        };
        c.swap(i1, i2);
    }
    c
}

/// A tileset as referenced by one map: shared data plus the map's `firstgid`.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// First gid this map assigns to the tileset.
    pub firstgid: u32,
    /// The shared tileset.
    pub data: Rc<TilesetData>,
}

impl Tileset {
    /// Places `data` at `firstgid`.
    pub fn new(data: Rc<TilesetData>, firstgid: u32) -> Self {
        Tileset { firstgid, data }
    }

    /// Whether `gid` falls in this tileset's range.
    #[inline]
    pub fn contains(&self, gid: u32) -> bool {
        gid >= self.firstgid && gid - self.firstgid < self.data.tile_count
    }

    /// Tileset-local id of `gid` (flip bits already stripped).
    #[inline]
    pub fn local_id(&self, gid: u32) -> u32 {
        gid - self.firstgid
    }
}

/// Linear scan for the tileset whose `[firstgid, firstgid + tilecount)` range
/// holds `gid`.
pub(crate) fn tileset_index_for_gid(tilesets: &[Tileset], gid: u32) -> Result<usize> {
    tilesets
        .iter()
        .position(|t| t.contains(gid))
        .ok_or(EngineError::TileNotFound(gid))
}

impl Deref for Tileset {
    type Target = TilesetData;

    fn deref(&self) -> &TilesetData {
        &self.data
    }
}

/// Cache of external tilesets keyed by file path.
///
/// Maps loaded through the same registry share one `TilesetData` per `.tsx`
/// file; the first load wins and entries are never evicted. The registry is
/// owned by the caller and must stay alive as long as it is used for loading;
/// maps keep their tilesets alive on their own through `Rc`.
#[derive(Default)]
pub struct TilesetRegistry {
    shared: HashMap<PathBuf, Rc<TilesetData>>,
}

impl TilesetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tileset at `path`, loading it on first use.
    pub fn get(&mut self, path: impl AsRef<Path>) -> Result<Rc<TilesetData>> {
        let path = path.as_ref();
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(data) = self.shared.get(&key) {
            log::debug!("tileset {} served from registry", key.display());
            return Ok(Rc::clone(data));
        }
        let data = Rc::new(TilesetData::load_file(path)?);
        log::debug!("tileset {} loaded ({} tiles)", key.display(), data.tile_count);
        self.shared.insert(key, Rc::clone(&data));
        Ok(data)
    }

    /// Whether `path` is already loaded.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.shared.contains_key(&key)
    }

    /// Number of cached tilesets.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.shared.is_empty()
    }

    /// Loads the texture of every cached tileset that has none yet.
    pub async fn load_textures(&self, settings: &TextureSettings) -> anyhow::Result<()> {
        for data in self.shared.values() {
            data.load_texture(settings).await?;
        }
        Ok(())
    }
}
