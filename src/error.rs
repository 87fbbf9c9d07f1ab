use std::path::PathBuf;

use thiserror::Error;

/// Rejected map data. A map that passes validation can be walked by the DDA
/// without ever leaving the grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no cells")]
    Empty,
    #[error("map column {column} has {len} cells, expected {expected}")]
    Ragged {
        column: usize,
        len: usize,
        expected: usize,
    },
    #[error("border cell ({x}, {y}) is empty, the map edge must be solid")]
    OpenBorder { x: usize, y: usize },
    #[error("start cell ({x}, {y}) is outside the map or inside a wall")]
    BlockedStart { x: i64, y: i64 },
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture size {width}x{height} is not a power of two")]
    NotPowerOfTwo { width: usize, height: usize },
    #[error("texture has {actual} pixels, expected {expected}")]
    PixelCount { actual: usize, expected: usize },
    #[error("texture is {width}x{height}, atlas expects {expected}x{expected}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
    },
    #[error("atlas is full, ids stop at {max}")]
    AtlasFull { max: u16 },
    #[error("map uses texture id {id} but the atlas only holds {available}")]
    MissingId { id: u16, available: usize },
    #[error("failed to decode texture {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything that can go wrong while preparing the engine inputs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
