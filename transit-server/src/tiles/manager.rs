//! Offline tile cache manager.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::TileError;
use super::fetcher::TileFetcher;
use super::grid::{Region, TileKey};
use super::source::TileSource;
use super::store::TileStore;

/// Configuration for tile precaching.
#[derive(Debug, Clone)]
pub struct TileConfig {
    /// Area to keep offline.
    pub region: Region,

    /// Tiles downloaded concurrently per batch.
    pub batch_size: usize,

    /// Pause between batches.
    pub batch_delay: Duration,

    /// Where tiles are downloaded from.
    pub source: TileSource,

    /// Re-download tiles already in the store when precaching.
    pub refresh_existing: bool,
}

impl TileConfig {
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    pub fn with_source(mut self, source: TileSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_refresh_existing(mut self, refresh_existing: bool) -> Self {
        self.refresh_existing = refresh_existing;
        self
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            region: Region::boston(),
            batch_size: 10,
            batch_delay: Duration::from_millis(100),
            source: TileSource::openstreetmap(),
            refresh_existing: false,
        }
    }
}

/// Running totals for a download, reported after every batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    pub downloaded: usize,
    pub failed: usize,
    pub total: usize,
    /// Share of tiles downloaded successfully so far, 0 to 100.
    /// Failed tiles never count towards it.
    pub percentage: u8,
}

impl DownloadProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, ok: bool) {
        if ok {
            self.downloaded += 1;
        } else {
            self.failed += 1;
        }
        self.percentage = match self.total {
            0 => 0,
            total => (self.downloaded.min(total) * 100 / total) as u8,
        };
    }
}

/// Where a tile should be displayed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileResolution {
    /// Stored image bytes.
    Cached(Vec<u8>),
    /// Live URL to load the tile from instead.
    Remote(String),
}

/// Downloads tiles into a [`TileStore`] and resolves tiles for display.
pub struct TileCacheManager<F> {
    fetcher: F,
    store: TileStore,
    config: TileConfig,
}

impl<F: TileFetcher> TileCacheManager<F> {
    pub fn new(fetcher: F, store: TileStore, config: TileConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    /// Download every tile of the configured region.
    ///
    /// Tiles already stored are skipped unless `refresh_existing` is set.
    pub async fn precache(&self, on_progress: impl FnMut(&DownloadProgress)) -> DownloadProgress {
        let mut tiles = self.config.region.tiles();
        let planned = tiles.len();

        if !self.config.refresh_existing {
            let mut missing = Vec::with_capacity(tiles.len());
            for key in tiles {
                if !self.store.contains(key).await {
                    missing.push(key);
                }
            }
            tiles = missing;
        }

        info!(
            planned,
            to_download = tiles.len(),
            "precaching map tiles"
        );
        self.download(&tiles, on_progress).await
    }

    /// Download `tiles` in fixed-size concurrent batches.
    ///
    /// A failed tile is counted and logged; it never stops the run.
    /// `on_progress` is called after each batch.
    pub async fn download(
        &self,
        tiles: &[TileKey],
        mut on_progress: impl FnMut(&DownloadProgress),
    ) -> DownloadProgress {
        let mut progress = DownloadProgress::new(tiles.len());
        let batch_size = self.config.batch_size.max(1);
        let batches = tiles.len().div_ceil(batch_size);

        for (i, batch) in tiles.chunks(batch_size).enumerate() {
            let results = join_all(batch.iter().map(|&key| self.download_one(key))).await;

            for (key, result) in batch.iter().zip(results) {
                if let Err(e) = &result {
                    warn!(tile = %key, error = %e, "tile download failed");
                }
                progress.record(result.is_ok());
            }

            debug!(
                batch = i + 1,
                batches,
                downloaded = progress.downloaded,
                failed = progress.failed,
                "tile batch complete"
            );
            on_progress(&progress);

            if i + 1 < batches {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        info!(
            downloaded = progress.downloaded,
            failed = progress.failed,
            total = progress.total,
            "tile download complete"
        );
        progress
    }

    async fn download_one(&self, key: TileKey) -> Result<(), TileError> {
        let url = self.config.source.url(key);
        let bytes = self.fetcher.fetch(&url).await?;
        self.store.put(key, &bytes, &url).await
    }

    /// Stored bytes for `key`, or the live URL on a miss.
    ///
    /// Never writes to the store.
    pub async fn resolve(&self, key: TileKey) -> TileResolution {
        match self.store.get(key).await {
            Ok(Some(bytes)) => TileResolution::Cached(bytes),
            Ok(None) => TileResolution::Remote(self.config.source.url(key)),
            Err(e) => {
                warn!(tile = %key, error = %e, "unreadable stored tile");
                TileResolution::Remote(self.config.source.url(key))
            }
        }
    }
}
