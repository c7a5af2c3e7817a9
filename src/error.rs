use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading or querying engine data.
#[derive(Debug, Error)]
pub enum EngineError {
    /// File I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Malformed TMX/TSX document
    #[error("failed to parse {origin}: {source}")]
    FileParse {
        /// Path or description of the parsed text.
        origin: String,
        /// Deserializer error.
        #[source]
        source: quick_xml::DeError,
    },
    /// Structurally invalid map (missing root attributes, bad tileset reference, ...)
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// A layer's data length does not match width * height
    #[error("invalid layer size for layer '{layer}': expected {expected} tiles, found {found}")]
    InvalidLayerSize {
        /// Layer name.
        layer: String,
        /// `width * height` of the layer.
        expected: usize,
        /// Number of gids in its data.
        found: usize,
    },
    /// Tile data that could not be decoded
    #[error("malformed tile data in layer '{layer}': {reason}")]
    InvalidLayerData {
        /// Layer name.
        layer: String,
        /// What went wrong.
        reason: String,
    },
    /// Tile data encoding or compression that is not handled
    #[error("unsupported tile data encoding in layer '{layer}': encoding={encoding:?} compression={compression:?}")]
    UnsupportedEncoding {
        /// Layer name.
        layer: String,
        /// `encoding` attribute, if any.
        encoding: Option<String>,
        /// `compression` attribute, if any.
        compression: Option<String>,
    },
    /// Tile id outside `[0, tilecount)` of its tileset
    #[error("tile id {id} out of range for tileset '{tileset}' ({tile_count} tiles)")]
    InvalidTileId {
        /// Tileset name.
        tileset: String,
        /// Offending local id.
        id: u32,
        /// Tiles in the tileset.
        tile_count: u32,
    },
    /// A gid that no tileset of the map covers
    #[error("tile gid {0} not found in any tileset")]
    TileNotFound(u32),
    /// Property with a `type` outside the Tiled property types
    #[error("unsupported type '{kind}' for property '{name}'")]
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// Declared type.
        kind: String,
    },
    /// Property value that does not parse as its declared type
    #[error("invalid value '{value}' for property '{name}' of type {kind}")]
    InvalidPropertyValue {
        /// Property name.
        name: String,
        /// Declared type.
        kind: String,
        /// Raw value.
        value: String,
    },
    /// Bitmap font lookup for an unmapped character
    #[error("bitmap font has no glyph for character {0:?}")]
    MissingGlyph(char),
    /// Unreadable engine config
    #[error("invalid engine config: {0}")]
    Config(#[from] ron::error::SpannedError),
}

/// Result with [`EngineError`] as the error.
pub type Result<T> = std::result::Result<T, EngineError>;
