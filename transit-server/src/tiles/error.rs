//! Tile error types.

use std::path::PathBuf;

/// Errors from downloading or storing map tiles.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Tile server returned a non-success status.
    #[error("tile server returned {status} for {url}")]
    Status { url: String, status: u16 },

    /// Reading or writing the tile store failed.
    #[error("tile store I/O error at {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    /// Not a valid `z/x/y` tile address.
    #[error("invalid tile {0}")]
    InvalidKey(String),
}

impl TileError {
    pub(crate) fn io(path: impl Into<PathBuf>, e: impl std::fmt::Display) -> Self {
        TileError::Io {
            path: path.into(),
            message: e.to_string(),
        }
    }
}
