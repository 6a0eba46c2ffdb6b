//! Prediction time resolution.
//!
//! Upstream predictions carry RFC 3339 arrival and departure timestamps,
//! either of which may be missing. The first stop of a trip has no
//! arrival; the last has no departure.

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::Prediction;

/// Why a prediction has no usable time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("prediction has neither arrival nor departure time")]
    Missing,

    #[error("invalid timestamp {value:?}: {reason}")]
    Invalid { value: String, reason: String },
}

/// The time a prediction should be displayed at.
///
/// Arrival wins when present, even if it fails to parse.
pub fn resolve_time(prediction: &Prediction) -> Result<DateTime<FixedOffset>, TimeError> {
    let raw = present(&prediction.arrival_time)
        .or_else(|| present(&prediction.departure_time))
        .ok_or(TimeError::Missing)?;

    DateTime::parse_from_rfc3339(raw).map_err(|e| TimeError::Invalid {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Signed whole minutes from `now` until `time`, rounded towards negative
/// infinity.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use transit_server::predictions::minutes_until;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap();
/// let at = |s| DateTime::parse_from_rfc3339(s).unwrap();
///
/// assert_eq!(minutes_until(at("2024-03-15T14:02:59Z"), now), 2);
/// assert_eq!(minutes_until(at("2024-03-15T10:00:30-04:00"), now), 0);
/// assert_eq!(minutes_until(at("2024-03-15T13:59:59Z"), now), -1);
/// ```
pub fn minutes_until(time: DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    time.with_timezone(&Utc)
        .signed_duration_since(now)
        .num_seconds()
        .div_euclid(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn prediction(arrival: Option<&str>, departure: Option<&str>) -> Prediction {
        Prediction {
            id: "p".into(),
            stop_id: None,
            route_id: None,
            direction_id: None,
            arrival_time: arrival.map(str::to_string),
            departure_time: departure.map(str::to_string),
            status: None,
        }
    }

    #[test]
    fn arrival_preferred_over_departure() {
        let p = prediction(
            Some("2024-03-15T14:05:00-04:00"),
            Some("2024-03-15T14:06:00-04:00"),
        );
        assert_eq!(resolve_time(&p).unwrap().to_rfc3339(), "2024-03-15T14:05:00-04:00");
    }

    #[test]
    fn departure_used_when_no_arrival() {
        let p = prediction(None, Some("2024-03-15T14:06:00-04:00"));
        assert_eq!(resolve_time(&p).unwrap().to_rfc3339(), "2024-03-15T14:06:00-04:00");

        let p = prediction(Some(""), Some("2024-03-15T14:06:00-04:00"));
        assert!(resolve_time(&p).is_ok());
    }

    #[test]
    fn missing_and_invalid_times() {
        assert_eq!(resolve_time(&prediction(None, None)), Err(TimeError::Missing));

        let p = prediction(Some("14:05"), Some("2024-03-15T14:06:00-04:00"));
        assert!(matches!(resolve_time(&p), Err(TimeError::Invalid { .. })));
    }

    #[test]
    fn minutes_round_down() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
        let at = |s| DateTime::parse_from_rfc3339(s).unwrap();

        assert_eq!(minutes_until(at("2024-03-15T18:00:00Z"), now), 0);
        assert_eq!(minutes_until(at("2024-03-15T18:00:59Z"), now), 0);
        assert_eq!(minutes_until(at("2024-03-15T17:59:30Z"), now), -1);
        assert_eq!(minutes_until(at("2024-03-15T17:30:00Z"), now), -30);
        assert_eq!(minutes_until(at("2024-03-15T14:12:00-04:00"), now), 12);
    }
}
