//! Transit client with caching.

use std::sync::Arc;

use crate::domain::{Alert, Facility, Line, PredictionBatch, RouteCollection, Shape, Stop};
use crate::gateway::{GatewayError, TransitApi};

use super::entry::{CacheEntry, Payload};
use super::error::CacheError;
use super::key::CacheKey;
use super::store::{CacheConfig, TtlStore};

/// Wraps a [`TransitApi`] and caches lines, routes, stops and shapes.
///
/// Predictions, alerts and facilities pass straight through to the API on
/// every call.
pub struct CachedTransitClient<A> {
    api: Arc<A>,
    store: TtlStore,
}

impl<A: TransitApi> CachedTransitClient<A> {
    /// Create a new cached client with its own store.
    pub fn new(api: A, cache_config: &CacheConfig) -> Self {
        Self::with_store(api, TtlStore::new(cache_config))
    }

    /// Create a cached client over an existing store.
    pub fn with_store(api: A, store: TtlStore) -> Self {
        Self {
            api: Arc::new(api),
            store,
        }
    }

    /// Lines shown on the map.
    pub async fn lines(&self) -> Result<Arc<Vec<Line>>, CacheError> {
        let api = Arc::clone(&self.api);
        let entry = self
            .store
            .get_or_refresh(CacheKey::operation("lines"), move || async move {
                api.fetch_lines().await.map(|l| Payload::Lines(Arc::new(l)))
            })
            .await?;

        match &entry.payload {
            Payload::Lines(lines) => Ok(Arc::clone(lines)),
            other => Err(mismatch(&entry, "lines", other)),
        }
    }

    /// Routes with their lines, optionally restricted to one line.
    ///
    /// A blank `line_id` means every line.
    pub async fn routes(&self, line_id: Option<&str>) -> Result<Arc<RouteCollection>, CacheError> {
        let line_id = line_id.map(str::trim).filter(|l| !l.is_empty());
        let key = CacheKey::new("routes", &[line_id.unwrap_or_default()]);
        let api = Arc::clone(&self.api);
        let line_id = line_id.map(str::to_string);
        let entry = self
            .store
            .get_or_refresh(key, move || async move {
                api.fetch_routes(line_id.as_deref())
                    .await
                    .map(|r| Payload::Routes(Arc::new(r)))
            })
            .await?;

        match &entry.payload {
            Payload::Routes(routes) => Ok(Arc::clone(routes)),
            other => Err(mismatch(&entry, "routes", other)),
        }
    }

    /// Stops served by any of `route_ids`.
    pub async fn stops(&self, route_ids: &[String]) -> Result<Arc<Vec<Stop>>, CacheError> {
        let key = CacheKey::new("stops", route_ids);
        if key == CacheKey::operation("stops") {
            return Ok(Arc::default());
        }

        let api = Arc::clone(&self.api);
        let route_ids = route_ids.to_vec();
        let entry = self
            .store
            .get_or_refresh(key, move || async move {
                api.fetch_stops(&route_ids)
                    .await
                    .map(|s| Payload::Stops(Arc::new(s)))
            })
            .await?;

        match &entry.payload {
            Payload::Stops(stops) => Ok(Arc::clone(stops)),
            other => Err(mismatch(&entry, "stops", other)),
        }
    }

    /// Display shapes for `route_ids`.
    pub async fn shapes(&self, route_ids: &[String]) -> Result<Arc<Vec<Shape>>, CacheError> {
        let key = CacheKey::new("shapes", route_ids);
        if key == CacheKey::operation("shapes") {
            return Ok(Arc::default());
        }

        let api = Arc::clone(&self.api);
        let route_ids = route_ids.to_vec();
        let entry = self
            .store
            .get_or_refresh(key, move || async move {
                api.fetch_shapes(&route_ids)
                    .await
                    .map(|s| Payload::Shapes(Arc::new(s)))
            })
            .await?;

        match &entry.payload {
            Payload::Shapes(shapes) => Ok(Arc::clone(shapes)),
            other => Err(mismatch(&entry, "shapes", other)),
        }
    }

    /// Live predictions at a stop.
    pub async fn predictions_for_stop(&self, stop_id: &str) -> Result<PredictionBatch, GatewayError> {
        self.api.fetch_predictions_for_stop(stop_id).await
    }

    /// Live predictions along a route.
    pub async fn predictions_for_route(
        &self,
        route_id: &str,
    ) -> Result<PredictionBatch, GatewayError> {
        self.api.fetch_predictions_for_route(route_id).await
    }

    /// Live alerts, most severe first.
    pub async fn alerts(&self, route_ids: &[String]) -> Result<Vec<Alert>, GatewayError> {
        self.api.fetch_alerts(route_ids).await
    }

    /// Live facilities at a stop.
    pub async fn facilities(&self, stop_id: &str) -> Result<Vec<Facility>, GatewayError> {
        self.api.fetch_facilities(stop_id).await
    }

    /// Access the underlying API for operations that bypass the cache.
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &TtlStore {
        &self.store
    }

    /// Drop every cached entry.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().await
    }
}

fn mismatch(entry: &CacheEntry, expected: &'static str, found: &Payload) -> CacheError {
    CacheError::PayloadMismatch {
        key: entry.key.clone(),
        expected,
        found: found.kind(),
    }
}
