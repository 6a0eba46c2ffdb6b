//! Typed transit entities.
//!
//! Relationship fields are plain id strings. They are weak references,
//! resolved by lookup against an [`EntitySet`](super::EntitySet) rather than
//! owned.

use serde::{Deserialize, Serialize};

/// Anything with a stable upstream identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A branded service identity (e.g. the Red Line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    /// Display name, e.g. "Red Line".
    pub name: String,
    /// Hex colour without the leading `#`.
    pub color: String,
    pub short_name: Option<String>,
    pub text_color: Option<String>,
    pub sort_order: Option<i64>,
}

/// An operational path variant belonging to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    /// Weak reference to the owning line.
    pub line_id: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    /// GTFS route type (0 = light rail, 1 = heavy rail).
    pub route_type: Option<i32>,
    #[serde(default)]
    pub direction_names: Vec<String>,
    pub sort_order: Option<i64>,
}

/// A physical station or platform location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub parent_station: Option<String>,
    /// Routes this stop was fetched for.
    #[serde(default)]
    pub route_ids: Vec<String>,
}

/// An encoded polyline path for a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    pub polyline: String,
    pub route_id: String,
}

/// An ephemeral arrival/departure forecast.
///
/// Every field is optional here; the prediction matcher decides which
/// records are usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    /// Raw stop reference, possibly a child platform of the stop the user picked.
    pub stop_id: Option<String>,
    pub route_id: Option<String>,
    pub direction_id: Option<u8>,
    /// RFC 3339 timestamp.
    pub arrival_time: Option<String>,
    /// RFC 3339 timestamp.
    pub departure_time: Option<String>,
    pub status: Option<String>,
}

/// A service alert affecting one or more routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub header: String,
    pub effect: Option<String>,
    pub severity: i64,
    pub lifecycle: Option<String>,
    #[serde(default)]
    pub route_ids: Vec<String>,
}

/// An accessibility facility (elevator, escalator, ...) at a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub facility_type: Option<String>,
    pub stop_id: Option<String>,
}

/// Routes together with their side-loaded lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCollection {
    pub routes: Vec<Route>,
    pub lines: Vec<Line>,
}

/// A live prediction fetch with its side-loaded stops and routes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionBatch {
    pub predictions: Vec<Prediction>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_identified!(Line, Route, Stop, Shape, Prediction, Alert, Facility);
