//! Caching layer for slowly-changing transit entities.
//!
//! Lines, routes, stops and shapes change rarely, so their responses are
//! cached for days and written through to disk. When a refresh fails, the
//! last good entry is served no matter how old it is. Predictions are never
//! cached.

mod client;
mod entry;
mod error;
mod key;
mod store;

pub use client::CachedTransitClient;
pub use entry::{CacheEntry, Payload};
pub use error::CacheError;
pub use key::CacheKey;
pub use store::{CacheConfig, TtlStore};
