//! Display labels for arrivals.

use std::fmt;

use serde::{Serialize, Serializer};

/// What the arrival list shows for one arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalLabel {
    /// The predicted time has already passed.
    Arriving,
    /// Less than a minute away.
    Due,
    /// Whole minutes away.
    Minutes(i64),
}

impl ArrivalLabel {
    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            m if m < 0 => ArrivalLabel::Arriving,
            0 => ArrivalLabel::Due,
            m => ArrivalLabel::Minutes(m),
        }
    }
}

impl fmt::Display for ArrivalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalLabel::Arriving => f.write_str("Arriving"),
            ArrivalLabel::Due => f.write_str("Due"),
            ArrivalLabel::Minutes(m) => write!(f, "{m} min"),
        }
    }
}

impl Serialize for ArrivalLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(ArrivalLabel::from_minutes(-5).to_string(), "Arriving");
        assert_eq!(ArrivalLabel::from_minutes(-1).to_string(), "Arriving");
        assert_eq!(ArrivalLabel::from_minutes(0).to_string(), "Due");
        assert_eq!(ArrivalLabel::from_minutes(1).to_string(), "1 min");
        assert_eq!(ArrivalLabel::from_minutes(12).to_string(), "12 min");
    }

    #[test]
    fn serializes_as_text() {
        let json = serde_json::to_string(&ArrivalLabel::Minutes(3)).unwrap();
        assert_eq!(json, "\"3 min\"");
    }
}
