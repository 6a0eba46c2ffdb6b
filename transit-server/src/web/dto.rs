//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Prediction, PredictionBatch, Route, Stop};
use crate::predictions::{Arrival, TargetStop};

/// Query carrying a comma-separated list of route ids.
#[derive(Debug, Default, Deserialize)]
pub struct RouteIdsQuery {
    /// Comma-separated route ids, e.g. `Red,Orange,Blue`
    pub route_ids: Option<String>,
}

impl RouteIdsQuery {
    /// The listed route ids, trimmed, or `None` if there are none.
    pub fn parse(&self) -> Option<Vec<String>> {
        let ids: Vec<String> = self
            .route_ids
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if ids.is_empty() { None } else { Some(ids) }
    }
}

/// Optional details about the stop arrivals are wanted for.
#[derive(Debug, Default, Deserialize)]
pub struct ArrivalsQuery {
    /// Match against predictions for this route instead of the stop's own
    pub route_id: Option<String>,

    /// Stop name for name matching
    pub name: Option<String>,

    /// Stop latitude for proximity matching
    pub lat: Option<f64>,

    /// Stop longitude for proximity matching
    pub lon: Option<f64>,
}

impl ArrivalsQuery {
    pub fn target(&self, stop_id: &str) -> TargetStop {
        TargetStop {
            id: stop_id.to_string(),
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

/// Envelope for list responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Raw live predictions with their side-loaded records.
#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    pub data: Vec<Prediction>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
}

impl From<PredictionBatch> for PredictionsResponse {
    fn from(batch: PredictionBatch) -> Self {
        Self {
            data: batch.predictions,
            stops: batch.stops,
            routes: batch.routes,
        }
    }
}

/// Ranked arrivals at one stop.
#[derive(Debug, Serialize)]
pub struct ArrivalsResponse {
    pub stop_id: String,
    pub arrivals: Vec<Arrival>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Entries currently held by the entity cache
    pub cached_entries: u64,
}

/// Response after clearing the cache.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
