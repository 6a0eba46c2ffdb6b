//! Cache error types.

use std::path::PathBuf;
use std::sync::Arc;

use crate::gateway::GatewayError;

use super::key::CacheKey;

/// Errors from the TTL cache.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Refresh failed and there was no earlier entry to fall back on.
    #[error("refresh of {key} failed: {source}")]
    Refresh {
        key: CacheKey,
        #[source]
        source: Arc<GatewayError>,
    },

    /// An entry held a different payload kind than its operation produces.
    #[error("cache entry {key} holds {found}, expected {expected}")]
    PayloadMismatch {
        key: CacheKey,
        expected: &'static str,
        found: &'static str,
    },

    /// Reading or writing the cache directory failed.
    #[error("cache I/O error at {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}
