use macroquad::prelude::*;

/// Side of a tile-layer chunk, in cells.
pub const CHUNK_TILES: u32 = 32;

const CULL_MARGIN_CHUNKS: i32 = 1;

/// Chunk position in chunk units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    /// Column of chunks.
    pub x: i32,
    /// Row of chunks.
    pub y: i32,
}

/// Chunk holding cell `(col, row)`.
#[inline]
pub fn cell_to_chunk(col: u32, row: u32) -> ChunkCoord {
    ChunkCoord {
        x: (col / CHUNK_TILES) as i32,
        y: (row / CHUNK_TILES) as i32,
    }
}

/// Inclusive chunk range covering `view` (in layer-local pixels), padded by one chunk.
pub fn visible_chunk_range(view: Rect, tile_size: Vec2) -> (ChunkCoord, ChunkCoord) {
    let chunk_w = (tile_size.x * CHUNK_TILES as f32).max(1.0);
    let chunk_h = (tile_size.y * CHUNK_TILES as f32).max(1.0);

    let mut cx_min = (view.x / chunk_w).floor() as i32;
    let mut cy_min = (view.y / chunk_h).floor() as i32;
    let mut cx_max = ((view.x + view.w) / chunk_w).floor() as i32;
    let mut cy_max = ((view.y + view.h) / chunk_h).floor() as i32;

    if cx_min > cx_max {
        std::mem::swap(&mut cx_min, &mut cx_max);
    }
    if cy_min > cy_max {
        std::mem::swap(&mut cy_min, &mut cy_max);
    }

    (
        ChunkCoord {
            x: cx_min - CULL_MARGIN_CHUNKS,
            y: cy_min - CULL_MARGIN_CHUNKS,
        },
        ChunkCoord {
            x: cx_max + CULL_MARGIN_CHUNKS,
            y: cy_max + CULL_MARGIN_CHUNKS,
        },
    )
}

/// Whether `c` lies in an inclusive range.
#[inline]
pub fn chunk_in_range(c: ChunkCoord, (min, max): (ChunkCoord, ChunkCoord)) -> bool {
    c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y
}
