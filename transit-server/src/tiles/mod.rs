//! Offline map tiles.
//!
//! A bounded region is precomputed into slippy-map tile addresses and
//! downloaded into a local store. At display time a stored tile is served
//! from disk; anything else falls back to the live tile server.

mod error;
mod fetcher;
mod grid;
mod manager;
mod source;
mod store;

pub use error::TileError;
pub use fetcher::{HttpTileFetcher, TileFetcher};
pub use grid::{Bounds, LatLng, MAX_ZOOM, Region, TileKey, lat_lng_to_tile};
pub use manager::{DownloadProgress, TileCacheManager, TileConfig, TileResolution};
pub use source::TileSource;
pub use store::{TileMeta, TileStore};
