//! Matching live predictions to the stop a rider is looking at.
//!
//! Upstream predictions reference platform-level stop ids, which rarely
//! equal the station id the rider picked. A prediction is matched to the
//! target in three tiers, first hit wins:
//!
//! 1. its stop id equals the target's id;
//! 2. its side-loaded stop's name equals the target's name, ignoring case;
//! 3. its side-loaded stop lies within a fixed tolerance of the target in
//!    both latitude and longitude.
//!
//! Predictions that match no tier are dropped. So are predictions with no
//! usable time, and predictions too far in the past.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Prediction, PredictionBatch, Route, RouteAliases, Stop, index_by_id};

use super::label::ArrivalLabel;
use super::time::{minutes_until, resolve_time};

/// Tunables for prediction matching.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Maximum absolute difference, in degrees, for both latitude and
    /// longitude in the proximity tier. 0.0001° is about 11 m.
    pub coordinate_tolerance_deg: f64,

    /// Predictions more than this many minutes in the past are dropped.
    pub stale_cutoff_mins: i64,

    /// Maximum number of arrivals returned.
    pub max_results: usize,
}

impl MatcherConfig {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_stale_cutoff(mut self, minutes: i64) -> Self {
        self.stale_cutoff_mins = minutes;
        self
    }

    pub fn with_coordinate_tolerance(mut self, degrees: f64) -> Self {
        self.coordinate_tolerance_deg = degrees;
        self
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            coordinate_tolerance_deg: 0.0001,
            stale_cutoff_mins: -30,
            max_results: 5,
        }
    }
}

/// The stop predictions are matched against.
///
/// Only the id is required. Without a name the name tier never matches;
/// without coordinates the proximity tier never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStop {
    pub id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TargetStop {
    /// A target known only by id.
    pub fn id_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            latitude: None,
            longitude: None,
        }
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl From<&Stop> for TargetStop {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: Some(stop.name.clone()),
            latitude: Some(stop.latitude),
            longitude: Some(stop.longitude),
        }
    }
}

/// Which tier matched a prediction to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    StopId,
    Name,
    Proximity,
}

/// A matched, timed prediction ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrival {
    pub prediction_id: String,
    /// Route id as published upstream.
    pub route_id: Option<String>,
    /// Canonical line for colouring and labelling.
    pub line_id: Option<String>,
    pub direction_id: Option<u8>,
    pub time: DateTime<FixedOffset>,
    /// Signed whole minutes from now.
    pub minutes: i64,
    pub label: ArrivalLabel,
    pub matched_by: MatchTier,
    pub status: Option<String>,
}

/// Reconciles raw predictions against a target stop.
#[derive(Debug, Clone, Default)]
pub struct PredictionMatcher {
    config: MatcherConfig,
    aliases: RouteAliases,
}

impl PredictionMatcher {
    pub fn new(config: MatcherConfig, aliases: RouteAliases) -> Self {
        Self { config, aliases }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match, time, rank and truncate a batch of predictions.
    ///
    /// The result is sorted by predicted time, earliest first, and holds at
    /// most `max_results` arrivals.
    pub fn match_predictions(
        &self,
        batch: &PredictionBatch,
        target: &TargetStop,
        now: DateTime<Utc>,
    ) -> Vec<Arrival> {
        let stops = index_by_id(&batch.stops);
        let routes = index_by_id(&batch.routes);

        let mut arrivals: Vec<Arrival> = batch
            .predictions
            .iter()
            .filter_map(|p| self.arrival(p, target, &stops, &routes, now))
            .collect();

        arrivals.sort_by_key(|a| a.time);
        arrivals.truncate(self.config.max_results);

        debug!(
            target_stop = %target.id,
            predictions = batch.predictions.len(),
            arrivals = arrivals.len(),
            "matched predictions"
        );
        arrivals
    }

    fn arrival(
        &self,
        prediction: &Prediction,
        target: &TargetStop,
        stops: &HashMap<&str, &Stop>,
        routes: &HashMap<&str, &Route>,
        now: DateTime<Utc>,
    ) -> Option<Arrival> {
        let matched_by = self.match_tier(prediction, target, stops)?;

        let time = match resolve_time(prediction) {
            Ok(time) => time,
            Err(e) => {
                warn!(prediction = %prediction.id, error = %e, "skipping prediction");
                return None;
            }
        };

        let minutes = minutes_until(time, now);
        if minutes < self.config.stale_cutoff_mins {
            debug!(prediction = %prediction.id, minutes, "dropping stale prediction");
            return None;
        }

        let line_id = prediction
            .route_id
            .as_deref()
            .and_then(|r| self.canonical_line(r, routes));

        Some(Arrival {
            prediction_id: prediction.id.clone(),
            route_id: prediction.route_id.clone(),
            line_id,
            direction_id: prediction.direction_id,
            time,
            minutes,
            label: ArrivalLabel::from_minutes(minutes),
            matched_by,
            status: prediction.status.clone(),
        })
    }

    /// The first tier under which `prediction` matches `target`, if any.
    pub fn match_tier(
        &self,
        prediction: &Prediction,
        target: &TargetStop,
        stops: &HashMap<&str, &Stop>,
    ) -> Option<MatchTier> {
        let stop_id = prediction.stop_id.as_deref()?;
        if stop_id == target.id {
            return Some(MatchTier::StopId);
        }

        let stop = stops.get(stop_id)?;

        if let Some(name) = &target.name
            && stop.name.trim().to_lowercase() == name.trim().to_lowercase()
        {
            return Some(MatchTier::Name);
        }

        if let Some((lat, lon)) = target.coordinates()
            && (stop.latitude - lat).abs() < self.config.coordinate_tolerance_deg
            && (stop.longitude - lon).abs() < self.config.coordinate_tolerance_deg
        {
            return Some(MatchTier::Proximity);
        }

        None
    }

    /// Canonical line for a route id.
    ///
    /// Alias routes map through the alias table; other routes through their
    /// side-loaded record, itself mapped if its line is an alias line.
    pub fn canonical_line(&self, route_id: &str, routes: &HashMap<&str, &Route>) -> Option<String> {
        if let Some(line) = self.aliases.canonical_line_for_route(route_id) {
            return Some(line.to_string());
        }

        let line_id = routes.get(route_id)?.line_id.as_deref()?;
        Some(
            self.aliases
                .canonical_line_for_line(line_id)
                .unwrap_or(line_id)
                .to_string(),
        )
    }
}
