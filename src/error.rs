/// Error types shared by the level, asset and score layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::animation::EntityKind;
use crate::domain::player::Action;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level file {path} not found")]
    NotFound { path: PathBuf },
    #[error("failed to read/write level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("level file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("tile key '{key}' does not match its position {x};{y}")]
    KeyMismatch { key: String, x: i32, y: i32 },
    #[error("invalid tile key '{0}' (expected \"x;y\")")]
    BadKey(String),
    #[error("tile_size must be positive")]
    ZeroTileSize,
    #[error("unknown tile type '{0}'")]
    UnknownTileKind(String),
    #[error("no level #{0} in the catalogue")]
    NoSuchLevel(usize),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no animation registered for {entity:?}/{action:?}")]
    MissingAnimation { entity: EntityKind, action: Action },
    #[error("animation {entity:?}/{action:?} has no frames or a zero frame duration")]
    EmptyAnimation { entity: EntityKind, action: Action },
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to read/write score file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score file {path} line {line} is malformed")]
    Malformed { path: PathBuf, line: usize },
}
