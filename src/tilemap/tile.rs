use bitflags::bitflags;

/// Gid bit 31.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
/// Gid bit 30.
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
/// Gid bit 29.
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
/// Lower 29 bits: the gid itself. Bit 28 is unused.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

bitflags! {
    /// Flip flags of a placed tile, i.e. the three high gid bits shifted down by 28.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileFlip: u8 {
        /// Mirrored left to right.
        const HORIZONTAL = 0x8;
        /// Mirrored top to bottom.
        const VERTICAL = 0x4;
        /// Mirrored across the top-left to bottom-right diagonal.
        const DIAGONAL = 0x2;
        /// Clockwise quarter turn.
        const ROTATE_90 = Self::HORIZONTAL.bits() | Self::DIAGONAL.bits();
        /// Half turn.
        const ROTATE_180 = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
        /// Counter-clockwise quarter turn.
        const ROTATE_270 = Self::VERTICAL.bits() | Self::DIAGONAL.bits();
    }
}

impl TileFlip {
    /// Flip bits of a raw gid.
    #[inline]
    pub fn from_raw_gid(raw: u32) -> Self {
        Self::from_bits_truncate((raw >> 28) as u8)
    }

    /// The flags back in gid bit positions.
    #[inline]
    pub fn raw_bits(self) -> u32 {
        u32::from(self.bits()) << 28
    }
}

/// One grid cell of a tile layer. `gid == 0` is an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tile {
    /// Global tile id, 0 for none.
    pub gid: u32,
    /// Flips applied when drawing.
    pub flip: TileFlip,
}

impl Tile {
    /// An empty cell.
    pub const EMPTY: Tile = Tile {
        gid: 0,
        flip: TileFlip::empty(),
    };

    /// Splits a raw gid into id and flips.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Tile {
            gid: raw & GID_MASK,
            flip: TileFlip::from_raw_gid(raw),
        }
    }

    /// The gid as stored in the document, flip bits included.
    #[inline]
    pub fn raw(self) -> u32 {
        self.gid | self.flip.raw_bits()
    }

    /// Whether the cell has no tile.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.gid == 0
    }
}
