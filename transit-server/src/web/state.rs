//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedTransitClient;
use crate::gateway::TransitClient;
use crate::predictions::ArrivalBoard;
use crate::tiles::{HttpTileFetcher, TileCacheManager};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Cached transit API client
    pub transit: Arc<CachedTransitClient<TransitClient>>,

    /// Live arrival matching
    pub arrivals: Arc<ArrivalBoard>,

    /// Offline map tiles
    pub tiles: Arc<TileCacheManager<HttpTileFetcher>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        transit: CachedTransitClient<TransitClient>,
        arrivals: ArrivalBoard,
        tiles: TileCacheManager<HttpTileFetcher>,
    ) -> Self {
        Self {
            transit: Arc::new(transit),
            arrivals: Arc::new(arrivals),
            tiles: Arc::new(tiles),
        }
    }
}
