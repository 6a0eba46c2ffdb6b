//! On-disk tile store.
//!
//! Layout is `root/z/x/y.png`, with a `root/z/x/y.json` sidecar recording
//! where the tile came from and when.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TileError;
use super::grid::TileKey;

/// Provenance of a stored tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMeta {
    pub source_url: String,
    pub stored_at: DateTime<Utc>,
}

/// Tiles on disk, kept until [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, key: TileKey) -> PathBuf {
        self.root.join(key.z.to_string()).join(key.x.to_string())
    }

    /// Path of the image for `key`.
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.dir(key).join(format!("{}.png", key.y))
    }

    fn meta_path(&self, key: TileKey) -> PathBuf {
        self.dir(key).join(format!("{}.json", key.y))
    }

    /// Image bytes for `key`, if stored.
    pub async fn get(&self, key: TileKey) -> Result<Option<Vec<u8>>, TileError> {
        let path = self.tile_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TileError::io(path, e)),
        }
    }

    /// Provenance for `key`, if stored with a readable sidecar.
    pub async fn meta(&self, key: TileKey) -> Result<Option<TileMeta>, TileError> {
        let path = self.meta_path(key);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TileError::io(path, e)),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| TileError::io(path, e))
    }

    pub async fn contains(&self, key: TileKey) -> bool {
        tokio::fs::try_exists(self.tile_path(key))
            .await
            .unwrap_or(false)
    }

    /// Store `bytes` for `key`, replacing any earlier copy.
    pub async fn put(&self, key: TileKey, bytes: &[u8], source_url: &str) -> Result<(), TileError> {
        let dir = self.dir(key);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TileError::io(&dir, e))?;

        let path = self.tile_path(key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| TileError::io(&path, e))?;

        let meta = TileMeta {
            source_url: source_url.to_string(),
            stored_at: Utc::now(),
        };
        let path = self.meta_path(key);
        let json = serde_json::to_string(&meta).map_err(|e| TileError::io(&path, e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| TileError::io(&path, e))
    }

    /// Remove every stored tile.
    pub async fn clear(&self) -> Result<(), TileError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TileError::io(&self.root, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KEY: TileKey = TileKey { z: 12, x: 1239, y: 1514 };

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempdir().unwrap();
        let store = TileStore::new(dir.path().join("tiles"));

        assert_eq!(store.get(KEY).await.unwrap(), None);
        assert!(!store.contains(KEY).await);

        store.put(KEY, b"png", "https://c.tile.openstreetmap.org/12/1239/1514.png").await.unwrap();

        assert_eq!(store.get(KEY).await.unwrap().as_deref(), Some(&b"png"[..]));
        assert!(store.contains(KEY).await);
        assert!(dir.path().join("tiles/12/1239/1514.png").exists());

        let meta = store.meta(KEY).await.unwrap().unwrap();
        assert_eq!(meta.source_url, "https://c.tile.openstreetmap.org/12/1239/1514.png");
    }

    #[tokio::test]
    async fn put_overwrites() {
        let dir = tempdir().unwrap();
        let store = TileStore::new(dir.path());

        store.put(KEY, b"old", "u").await.unwrap();
        store.put(KEY, b"new", "u").await.unwrap();

        assert_eq!(store.get(KEY).await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = tempdir().unwrap();
        let store = TileStore::new(dir.path().join("tiles"));
        store.put(KEY, b"png", "u").await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.contains(KEY).await);
        assert_eq!(store.meta(KEY).await.unwrap(), None);
    }
}
