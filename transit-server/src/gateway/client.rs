//! HTTP client for the transit V3 API.
//!
//! Every method is a single live request (or one request per route for
//! the fan-out fetches). Nothing here caches; see [`crate::cache`].

use std::collections::HashSet;
use std::future::Future;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::domain::{
    Alert, EntitySet, Facility, Line, PredictionBatch, RouteAliases, RouteCollection, Shape, Stop,
};

use super::api::TransitApi;
use super::convert::{
    convert_alert, convert_all, convert_facility, convert_line, convert_prediction,
    convert_route, convert_shape, convert_stop,
};
use super::error::GatewayError;
use super::shapes::ShapeSelection;
use super::types::Document;

/// Default base URL for the transit API.
const DEFAULT_BASE_URL: &str = "https://api-v3.mbta.com";

/// Lines shown by default: the four colour-named subway lines.
const DEFAULT_LINE_IDS: [&str; 4] = ["line-Red", "line-Orange", "line-Blue", "line-Green"];

/// Route types fetched: light rail and heavy rail.
const RAIL_ROUTE_TYPES: &str = "0,1";

/// Configuration for the transit client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Optional API key, sent as `x-api-key`. Anonymous access is rate limited.
    pub api_key: Option<String>,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Line ids kept by `fetch_lines`. Empty keeps every line.
    pub line_ids: Vec<String>,
    /// Auxiliary routes re-parented onto their canonical line
    pub aliases: RouteAliases,
    /// How per-route shapes are thinned for display
    pub shapes: ShapeSelection,
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            line_ids: DEFAULT_LINE_IDS.iter().map(|s| s.to_string()).collect(),
            aliases: RouteAliases::default(),
            shapes: ShapeSelection::default(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_line_ids(mut self, ids: Vec<String>) -> Self {
        self.line_ids = ids;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Transit API client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    base_url: String,
    line_ids: Vec<String>,
    aliases: RouteAliases,
    shapes: ShapeSelection,
}

impl TransitClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| GatewayError::Config("invalid API key format".to_string()))?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            line_ids: config.line_ids,
            aliases: config.aliases,
            shapes: config.shapes,
        })
    }

    /// GET a JSON:API document.
    async fn get_document(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Document, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "transit API request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GatewayError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GatewayError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    async fn fetch_stops_for_route(&self, route_id: &str) -> Result<Vec<Stop>, GatewayError> {
        let doc = self
            .get_document("/stops", &[("filter[route]", route_id)])
            .await?;
        Ok(convert_all(&doc.data, "stop", convert_stop))
    }

    async fn fetch_shapes_for_route(&self, route_id: &str) -> Result<Vec<Shape>, GatewayError> {
        let doc = self
            .get_document("/shapes", &[("filter[route]", route_id)])
            .await?;
        let shapes = convert_all(&doc.data, "shape", |r| convert_shape(r, route_id));
        Ok(self.shapes.select(route_id, shapes))
    }

    async fn fetch_predictions(
        &self,
        filter: (&str, &str),
    ) -> Result<PredictionBatch, GatewayError> {
        let doc = self
            .get_document("/predictions", &[filter, ("include", "stop,route")])
            .await?;
        Ok(PredictionBatch {
            predictions: convert_all(&doc.data, "prediction", convert_prediction),
            stops: convert_all(&doc.included, "stop", convert_stop),
            routes: convert_all(&doc.included, "route", convert_route),
        })
    }
}

impl TransitApi for TransitClient {
    async fn fetch_lines(&self) -> Result<Vec<Line>, GatewayError> {
        // /lines has no server-side filter, so narrow it here.
        let doc = self.get_document("/lines", &[]).await?;
        let lines = convert_all(&doc.data, "line", convert_line);
        Ok(lines
            .into_iter()
            .filter(|l| self.line_ids.is_empty() || self.line_ids.contains(&l.id))
            .collect())
    }

    async fn fetch_routes(&self, line_id: Option<&str>) -> Result<RouteCollection, GatewayError> {
        let doc = self
            .get_document(
                "/routes",
                &[("filter[type]", RAIL_ROUTE_TYPES), ("include", "line")],
            )
            .await?;
        let collection = RouteCollection {
            routes: convert_all(&doc.data, "route", convert_route),
            lines: convert_all(&doc.included, "line", convert_line),
        };
        Ok(reparent_routes(collection, &self.aliases, line_id))
    }

    async fn fetch_stops(&self, route_ids: &[String]) -> Result<Vec<Stop>, GatewayError> {
        let per_route = fan_out("stops", route_ids, |id| self.fetch_stops_for_route(id)).await;
        Ok(merge_stops(per_route))
    }

    async fn fetch_shapes(&self, route_ids: &[String]) -> Result<Vec<Shape>, GatewayError> {
        let per_route = fan_out("shapes", route_ids, |id| self.fetch_shapes_for_route(id)).await;
        let merged: EntitySet<Shape> = per_route.into_iter().flat_map(|(_, s)| s).collect();
        Ok(merged.into_vec())
    }

    async fn fetch_predictions_for_stop(
        &self,
        stop_id: &str,
    ) -> Result<PredictionBatch, GatewayError> {
        self.fetch_predictions(("filter[stop]", stop_id)).await
    }

    async fn fetch_predictions_for_route(
        &self,
        route_id: &str,
    ) -> Result<PredictionBatch, GatewayError> {
        self.fetch_predictions(("filter[route]", route_id)).await
    }

    async fn fetch_alerts(&self, route_ids: &[String]) -> Result<Vec<Alert>, GatewayError> {
        if route_ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = route_ids.join(",");
        let doc = self.get_document("/alerts", &alert_query(&joined)).await?;
        let mut alerts = convert_all(&doc.data, "alert", convert_alert);
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(alerts)
    }

    async fn fetch_facilities(&self, stop_id: &str) -> Result<Vec<Facility>, GatewayError> {
        let doc = self
            .get_document("/facilities", &[("filter[stop]", stop_id)])
            .await?;
        Ok(convert_all(&doc.data, "facility", convert_facility))
    }
}

/// Query for alerts active now on `route_ids`, with their routes side-loaded.
fn alert_query(route_ids: &str) -> [(&'static str, &str); 4] {
    [
        ("filter[route]", route_ids),
        ("filter[datetime]", "NOW"),
        ("include", "routes"),
        ("sort", "-severity"),
    ]
}

/// Run `fetch` once per distinct route id, concurrently.
///
/// Every outcome is observed. A failed route is logged and contributes an
/// empty list instead of failing the whole call.
pub(crate) async fn fan_out<'a, T, F, Fut>(
    what: &'static str,
    route_ids: &'a [String],
    fetch: F,
) -> Vec<(&'a str, Vec<T>)>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = Result<Vec<T>, GatewayError>>,
{
    let mut seen = HashSet::new();
    let distinct: Vec<&'a str> = route_ids
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect();

    let results = join_all(distinct.iter().map(|&id| fetch(id))).await;

    distinct
        .into_iter()
        .zip(results)
        .map(|(route_id, result)| match result {
            Ok(items) => (route_id, items),
            Err(e) => {
                warn!(route_id, error = %e, "{what} fetch failed; continuing without this route");
                (route_id, Vec::new())
            }
        })
        .collect()
}

/// Merge per-route stop lists. The first copy of a stop wins, and it
/// records every route it was seen on.
pub(crate) fn merge_stops(per_route: Vec<(&str, Vec<Stop>)>) -> Vec<Stop> {
    let mut merged: EntitySet<Stop> = EntitySet::new();
    for (route_id, stops) in per_route {
        for mut stop in stops {
            if let Some(known) = merged.get_mut(&stop.id) {
                if !known.route_ids.iter().any(|r| r == route_id) {
                    known.route_ids.push(route_id.to_string());
                }
                continue;
            }
            stop.route_ids = vec![route_id.to_string()];
            merged.insert(stop);
        }
    }
    merged.into_vec()
}

/// Attach alias routes to their canonical line, drop alias lines, and
/// optionally keep only one line's routes.
pub(crate) fn reparent_routes(
    mut collection: RouteCollection,
    aliases: &RouteAliases,
    line_id: Option<&str>,
) -> RouteCollection {
    for route in &mut collection.routes {
        let canonical = aliases.canonical_line_for_route(&route.id).or_else(|| {
            route
                .line_id
                .as_deref()
                .and_then(|l| aliases.canonical_line_for_line(l))
        });
        if let Some(canonical) = canonical {
            route.line_id = Some(canonical.to_string());
        }
    }

    collection.lines.retain(|l| !aliases.is_alias_line(&l.id));

    if let Some(line_id) = line_id {
        collection
            .routes
            .retain(|r| r.line_id.as_deref() == Some(line_id));
    }

    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Line, Route};

    fn route(id: &str, line: &str) -> Route {
        Route {
            id: id.to_string(),
            line_id: Some(line.to_string()),
            long_name: None,
            short_name: None,
            color: None,
            route_type: Some(1),
            direction_names: Vec::new(),
            sort_order: None,
        }
    }

    fn line(id: &str) -> Line {
        Line {
            id: id.to_string(),
            name: id.trim_start_matches("line-").to_string(),
            color: "000000".to_string(),
            short_name: None,
            text_color: None,
            sort_order: None,
        }
    }

    fn stop(id: &str) -> Stop {
        Stop {
            id: id.to_string(),
            name: id.to_string(),
            latitude: 42.0,
            longitude: -71.0,
            parent_station: None,
            route_ids: Vec::new(),
        }
    }

    #[test]
    fn config_builder() {
        let config = GatewayConfig::new()
            .with_api_key("key")
            .with_base_url("http://localhost:8080")
            .with_timeout(5);

        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.line_ids.len(), 4);
        assert!(config.line_ids.contains(&"line-Green".to_string()));
    }

    #[test]
    fn alert_query_side_loads_routes() {
        let query = alert_query("Red,Mattapan");
        assert!(query.contains(&("filter[route]", "Red,Mattapan")));
        assert!(query.contains(&("filter[datetime]", "NOW")));
        assert!(query.contains(&("include", "routes")));
    }

    #[test]
    fn client_creation() {
        assert!(TransitClient::new(GatewayConfig::new()).is_ok());
        assert!(TransitClient::new(GatewayConfig::new().with_api_key("bad\nkey")).is_err());
    }

    #[test]
    fn mattapan_routes_join_red_line() {
        let collection = RouteCollection {
            routes: vec![
                route("Red", "line-Red"),
                route("Mattapan", "line-Mattapan"),
                route("Orange", "line-Orange"),
            ],
            lines: vec![line("line-Red"), line("line-Mattapan"), line("line-Orange")],
        };

        let all = reparent_routes(collection.clone(), &RouteAliases::default(), None);
        assert_eq!(all.routes.len(), 3);
        assert_eq!(all.routes[1].line_id.as_deref(), Some("line-Red"));
        let line_ids: Vec<_> = all.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(line_ids, vec!["line-Red", "line-Orange"]);

        let red = reparent_routes(collection, &RouteAliases::default(), Some("line-Red"));
        let route_ids: Vec<_> = red.routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(route_ids, vec!["Red", "Mattapan"]);
    }

    #[test]
    fn merge_stops_dedups_and_records_routes() {
        let merged = merge_stops(vec![
            ("Green-B", vec![stop("place-pktrm"), stop("place-boyls")]),
            ("Red", vec![stop("place-pktrm"), stop("place-dwnxg")]),
            ("Orange", Vec::new()),
        ]);

        let ids: Vec<_> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["place-pktrm", "place-boyls", "place-dwnxg"]);
        assert_eq!(merged[0].route_ids, vec!["Green-B", "Red"]);
        assert_eq!(merged[2].route_ids, vec!["Red"]);
    }

    #[tokio::test]
    async fn fan_out_tolerates_a_failing_route() {
        let route_ids = vec!["Red".to_string(), "Blue".to_string(), "Orange".to_string()];

        let results = fan_out("stops", &route_ids, |id| async move {
            if id == "Blue" {
                Err(GatewayError::Api {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(vec![stop(&format!("{id}-stop"))])
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.len(), 1);
        assert_eq!(results[1], ("Blue", Vec::new()));
        assert_eq!(results[2].1[0].id, "Orange-stop");
    }

    #[tokio::test]
    async fn fan_out_requests_each_route_once() {
        let route_ids = vec!["Red".to_string(), "Red".to_string(), "Blue".to_string()];
        let calls = std::sync::Mutex::new(Vec::new());

        let results = fan_out("shapes", &route_ids, |id| {
            calls.lock().unwrap().push(id.to_string());
            async { Ok::<Vec<Stop>, GatewayError>(Vec::new()) }
        })
        .await;

        assert_eq!(results.len(), 2);
        assert_eq!(*calls.lock().unwrap(), vec!["Red", "Blue"]);
    }
}
