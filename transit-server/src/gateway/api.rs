//! The gateway seam.

use std::future::Future;

use crate::domain::{Alert, Facility, Line, PredictionBatch, RouteCollection, Shape, Stop};

use super::error::GatewayError;

/// Operations the rest of the server needs from the upstream transit API.
///
/// Implemented by [`TransitClient`](super::TransitClient) over HTTP; tests
/// substitute in-memory fakes. Futures are `Send` so results can be shared
/// across tasks by the cache's refresh guard.
pub trait TransitApi: Send + Sync + 'static {
    /// Lines shown on the map.
    fn fetch_lines(&self) -> impl Future<Output = Result<Vec<Line>, GatewayError>> + Send;

    /// Routes with side-loaded lines, optionally restricted to one line.
    fn fetch_routes(
        &self,
        line_id: Option<&str>,
    ) -> impl Future<Output = Result<RouteCollection, GatewayError>> + Send;

    /// Stops served by any of `route_ids`, deduplicated.
    fn fetch_stops(
        &self,
        route_ids: &[String],
    ) -> impl Future<Output = Result<Vec<Stop>, GatewayError>> + Send;

    /// Display shapes for each of `route_ids`, deduplicated.
    fn fetch_shapes(
        &self,
        route_ids: &[String],
    ) -> impl Future<Output = Result<Vec<Shape>, GatewayError>> + Send;

    /// Live predictions at a stop. Never cached.
    fn fetch_predictions_for_stop(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<PredictionBatch, GatewayError>> + Send;

    /// Live predictions along a route. Never cached.
    fn fetch_predictions_for_route(
        &self,
        route_id: &str,
    ) -> impl Future<Output = Result<PredictionBatch, GatewayError>> + Send;

    /// Active alerts for `route_ids`, most severe first.
    fn fetch_alerts(
        &self,
        route_ids: &[String],
    ) -> impl Future<Output = Result<Vec<Alert>, GatewayError>> + Send;

    /// Facilities at a stop.
    fn fetch_facilities(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<Vec<Facility>, GatewayError>> + Send;
}
