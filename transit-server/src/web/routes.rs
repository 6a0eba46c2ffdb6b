//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::cache::CacheError;
use crate::domain::Alert;
use crate::gateway::GatewayError;
use crate::tiles::{TileKey, TileResolution};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// `cors_origins` are the frontend origins allowed to call the API.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/lines", get(lines))
        .route("/api/routes", get(all_routes))
        .route("/api/routes/:line_id", get(routes_for_line))
        .route("/api/stops", get(stops))
        .route("/api/stops/:route_id", get(stops_for_route))
        .route("/api/shapes", get(shapes))
        .route("/api/shapes/:route_id", get(shapes_for_route))
        .route("/api/predictions/stop/:stop_id", get(predictions_for_stop))
        .route("/api/predictions/route/:route_id", get(predictions_for_route))
        .route("/api/predictions/:route_id", get(predictions_for_route))
        .route("/api/arrivals/:stop_id", get(arrivals))
        .route("/api/alerts/:line_id", get(alerts))
        .route("/api/facilities/:stop_id", get(facilities))
        .route("/api/cache/clear", post(clear_cache))
        .route("/tiles/:z/:x/:y", get(tile))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        cached_entries: state.transit.store().entry_count(),
    })
}

async fn lines(State(state): State<AppState>) -> Result<Response, AppError> {
    let lines = state.transit.lines().await?;
    Ok(Json(DataResponse::new(lines)).into_response())
}

/// All rail routes with their lines.
async fn all_routes(State(state): State<AppState>) -> Result<Response, AppError> {
    let routes = state.transit.routes(None).await?;
    Ok(Json(routes).into_response())
}

/// Routes of one line, including alias routes shown under it.
async fn routes_for_line(
    State(state): State<AppState>,
    Path(line_id): Path<String>,
) -> Result<Response, AppError> {
    let routes = state.transit.routes(Some(&line_id)).await?;
    Ok(Json(routes).into_response())
}

async fn stops(
    State(state): State<AppState>,
    Query(query): Query<RouteIdsQuery>,
) -> Result<Response, AppError> {
    let route_ids = require_route_ids(&query)?;
    let stops = state.transit.stops(&route_ids).await?;
    Ok(Json(DataResponse::new(stops)).into_response())
}

async fn stops_for_route(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Response, AppError> {
    let stops = state.transit.stops(&[route_id]).await?;
    Ok(Json(DataResponse::new(stops)).into_response())
}

async fn shapes(
    State(state): State<AppState>,
    Query(query): Query<RouteIdsQuery>,
) -> Result<Response, AppError> {
    let route_ids = require_route_ids(&query)?;
    let shapes = state.transit.shapes(&route_ids).await?;
    Ok(Json(DataResponse::new(shapes)).into_response())
}

async fn shapes_for_route(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Response, AppError> {
    let shapes = state.transit.shapes(&[route_id]).await?;
    Ok(Json(DataResponse::new(shapes)).into_response())
}

fn require_route_ids(query: &RouteIdsQuery) -> Result<Vec<String>, AppError> {
    query.parse().ok_or_else(|| AppError::BadRequest {
        message: "route_ids parameter is required".to_string(),
    })
}

/// Raw predictions at a stop. Always live.
async fn predictions_for_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Response, AppError> {
    let batch = state.transit.predictions_for_stop(&stop_id).await?;
    Ok(Json(PredictionsResponse::from(batch)).into_response())
}

/// Raw predictions along a route. Always live.
async fn predictions_for_route(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Response, AppError> {
    let batch = state.transit.predictions_for_route(&route_id).await?;
    Ok(Json(PredictionsResponse::from(batch)).into_response())
}

/// Matched, ranked and labelled arrivals at a stop.
async fn arrivals(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    Query(query): Query<ArrivalsQuery>,
) -> Result<Response, AppError> {
    let target = query.target(&stop_id);
    let api = state.transit.api();

    let arrivals = match query.route_id.as_deref().filter(|r| !r.is_empty()) {
        Some(route_id) => {
            state
                .arrivals
                .for_stop_on_route(api, &target, route_id)
                .await?
        }
        None => state.arrivals.for_stop(api, &target).await?,
    };

    Ok(Json(ArrivalsResponse { stop_id, arrivals }).into_response())
}

/// Active alerts for every route of a line.
async fn alerts(
    State(state): State<AppState>,
    Path(line_id): Path<String>,
) -> Result<Response, AppError> {
    let routes = state.transit.routes(Some(&line_id)).await?;
    let route_ids: Vec<String> = routes.routes.iter().map(|r| r.id.clone()).collect();
    if route_ids.is_empty() {
        return Ok(Json(DataResponse::new(Vec::<Alert>::new())).into_response());
    }

    let alerts = state.transit.alerts(&route_ids).await?;
    Ok(Json(DataResponse::new(alerts)).into_response())
}

async fn facilities(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Response, AppError> {
    let facilities = state.transit.facilities(&stop_id).await?;
    Ok(Json(DataResponse::new(facilities)).into_response())
}

async fn clear_cache(State(state): State<AppState>) -> Result<Response, AppError> {
    state.transit.clear().await?;
    Ok(Json(ClearResponse { cleared: true }).into_response())
}

/// A map tile: stored bytes, or a redirect to the live tile server.
async fn tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let key: TileKey = format!("{z}/{x}/{y}")
        .parse()
        .map_err(|e: crate::tiles::TileError| AppError::BadRequest {
            message: e.to_string(),
        })?;

    let response = match state.tiles.resolve(key).await {
        TileResolution::Cached(bytes) => {
            ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        TileResolution::Remote(url) => Redirect::temporary(&url).into_response(),
    };
    Ok(response)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Upstream { message: String },
    Internal { message: String },
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Refresh { .. } => AppError::Upstream {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest { message }
            | AppError::Upstream { message }
            | AppError::Internal { message } => message,
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "bad request");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::CacheKey;

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = AppError::from(GatewayError::RateLimited);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = AppError::from(CacheError::Refresh {
            key: CacheKey::operation("lines"),
            source: Arc::new(GatewayError::Unauthorized),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn cache_corruption_is_internal() {
        let err = AppError::from(CacheError::PayloadMismatch {
            key: CacheKey::operation("lines"),
            expected: "lines",
            found: "stops",
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_route_ids_is_bad_request() {
        let err = require_route_ids(&RouteIdsQuery::default()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cors_layer_skips_invalid_origins() {
        let _layer = cors_layer(&["http://localhost:5173".into(), "bad\norigin".into()]);
    }

    /// Serve the router against an upstream that refuses connections.
    async fn serve_offline(dir: &std::path::Path) -> std::net::SocketAddr {
        use crate::cache::{CacheConfig, CachedTransitClient};
        use crate::gateway::{GatewayConfig, TransitClient};
        use crate::predictions::ArrivalBoard;
        use crate::tiles::{HttpTileFetcher, TileCacheManager, TileConfig, TileStore};

        let api = TransitClient::new(
            GatewayConfig::new()
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(2),
        )
        .unwrap();
        let transit =
            CachedTransitClient::new(api, &CacheConfig::default().with_dir(dir.join("cache")));
        let fetcher =
            HttpTileFetcher::new("transit-server-test", std::time::Duration::from_secs(2)).unwrap();
        let store = TileStore::new(dir.join("tiles"));
        let tiles = TileCacheManager::new(fetcher, store, TileConfig::default());
        let state = AppState::new(transit, ArrivalBoard::default(), tiles);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(state, &[]);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn route_predictions_answer_on_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let addr = serve_offline(dir.path()).await;
        let http = reqwest::Client::new();

        for path in ["/api/predictions/Red", "/api/predictions/route/Red"] {
            let response = http.get(format!("http://{addr}{path}")).send().await.unwrap();
            assert_eq!(response.status().as_u16(), 502, "{path}");
        }

        let response = http
            .get(format!("http://{addr}/api/predictions/stop/place-pktrm"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 502);
    }
}
