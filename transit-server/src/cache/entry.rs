//! Cache entries and their payloads.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Line, RouteCollection, Shape, Stop};

use super::key::CacheKey;

/// What a cache entry can hold.
///
/// Predictions have no variant, so they can never enter the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Lines(Arc<Vec<Line>>),
    Routes(Arc<RouteCollection>),
    Stops(Arc<Vec<Stop>>),
    Shapes(Arc<Vec<Shape>>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Lines(_) => "lines",
            Payload::Routes(_) => "routes",
            Payload::Stops(_) => "stops",
            Payload::Shapes(_) => "shapes",
        }
    }
}

/// An immutable payload stamped with its creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub created_at: DateTime<Utc>,
    pub payload: Payload,
}

impl CacheEntry {
    pub fn new(key: CacheKey, payload: Payload, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            created_at,
            payload,
        }
    }

    /// Age at `now`. Negative if the entry claims to come from the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// An entry is expired once its age reaches the TTL.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) >= ttl
    }
}
