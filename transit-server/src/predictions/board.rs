//! Live arrival boards.

use chrono::Utc;

use crate::domain::PredictionBatch;
use crate::gateway::{GatewayError, TransitApi};

use super::matcher::{Arrival, PredictionMatcher, TargetStop};

/// Fetches live predictions and turns them into a ranked arrival list.
///
/// Always goes to the API; predictions are never cached.
#[derive(Debug, Clone, Default)]
pub struct ArrivalBoard {
    matcher: PredictionMatcher,
}

impl ArrivalBoard {
    pub fn new(matcher: PredictionMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &PredictionMatcher {
        &self.matcher
    }

    /// Arrivals at `target`, from predictions fetched for that stop.
    ///
    /// A target known only by id picks up its name and coordinates from the
    /// side-loaded stop of the same id, if upstream sent one.
    pub async fn for_stop<A: TransitApi>(
        &self,
        api: &A,
        target: &TargetStop,
    ) -> Result<Vec<Arrival>, GatewayError> {
        let batch = api.fetch_predictions_for_stop(&target.id).await?;
        let target = enrich(target, &batch);
        Ok(self.matcher.match_predictions(&batch, &target, Utc::now()))
    }

    /// Arrivals at `target`, from predictions fetched along `route_id`.
    ///
    /// Route predictions reference platform stops, so this is where the
    /// name and proximity tiers do their work.
    pub async fn for_stop_on_route<A: TransitApi>(
        &self,
        api: &A,
        target: &TargetStop,
        route_id: &str,
    ) -> Result<Vec<Arrival>, GatewayError> {
        let batch = api.fetch_predictions_for_route(route_id).await?;
        let target = enrich(target, &batch);
        Ok(self.matcher.match_predictions(&batch, &target, Utc::now()))
    }
}

fn enrich(target: &TargetStop, batch: &PredictionBatch) -> TargetStop {
    let mut target = target.clone();
    if let Some(stop) = batch.stops.iter().find(|s| s.id == target.id) {
        target.name.get_or_insert_with(|| stop.name.clone());
        target.latitude.get_or_insert(stop.latitude);
        target.longitude.get_or_insert(stop.longitude);
    }
    target
}
