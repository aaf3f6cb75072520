/// Error types for the shell around the game rules.
///
/// The rules themselves cannot fail: movement is clamped and a lost
/// session is an ordinary outcome. What can fail is the terminal, the
/// config file and the sprite atlas.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config.toml parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("tileset error: {0}")]
    Tileset(#[from] TilesetError),
}

#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("sprite `{sprite}`: bad color `{value}`")]
    Color { sprite: String, value: String },

    #[error("sprite `{sprite}` needs {expected} frames, found {found}")]
    FrameCount { sprite: String, expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, GameError>;
