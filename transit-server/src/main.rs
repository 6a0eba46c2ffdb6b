use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::cache::{CacheConfig, CachedTransitClient, TtlStore};
use transit_server::gateway::{GatewayConfig, TransitClient};
use transit_server::predictions::ArrivalBoard;
use transit_server::tiles::{HttpTileFetcher, TileCacheManager, TileConfig, TileStore};
use transit_server::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const TILE_USER_AGENT: &str = concat!("transit-server/", env!("CARGO_PKG_VERSION"));

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Configuration from environment
    let api_key = std::env::var("MBTA_API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("MBTA_API_KEY not set; requests will be rate limited");
    }
    let data_dir =
        PathBuf::from(std::env::var("TRANSIT_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()));
    let addr: SocketAddr = std::env::var("TRANSIT_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()
        .expect("TRANSIT_BIND_ADDR must be a socket address");
    let cors_origins: Vec<String> = std::env::var("TRANSIT_CORS_ORIGINS")
        .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    // Transit client with persistent cache
    let mut gateway_config = GatewayConfig::default();
    if let Some(key) = api_key {
        gateway_config = gateway_config.with_api_key(key);
    }
    let client = TransitClient::new(gateway_config).expect("Failed to create transit client");

    let cache_config = CacheConfig::default().with_dir(data_dir.join("cache"));
    let store = TtlStore::new(&cache_config);
    match store.init().await {
        Ok(count) => info!(count, "cache ready"),
        Err(e) => warn!(error = %e, "starting with an empty cache"),
    }
    let transit = CachedTransitClient::with_store(client, store);

    // Offline map tiles
    let fetcher = HttpTileFetcher::new(TILE_USER_AGENT, Duration::from_secs(30))
        .expect("Failed to create tile fetcher");
    let tiles = TileCacheManager::new(
        fetcher,
        TileStore::new(data_dir.join("tiles")),
        TileConfig::default(),
    );

    let state = AppState::new(transit, ArrivalBoard::default(), tiles);

    // Download the offline region in the background
    if env_flag("TRANSIT_PRECACHE_TILES") {
        let tiles = state.tiles.clone();
        tokio::spawn(async move {
            tiles
                .precache(|p| {
                    info!(
                        downloaded = p.downloaded,
                        failed = p.failed,
                        total = p.total,
                        "tile precache {}%",
                        p.percentage
                    )
                })
                .await;
        });
    }

    let app = create_router(state, &cors_origins);

    info!(%addr, "transit server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
