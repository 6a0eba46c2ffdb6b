//! Prediction matching and ranking.
//!
//! Predictions are always fetched live. This module decides which of them
//! belong to the stop a rider is looking at, which line they should be
//! shown under, and in what order.

mod board;
mod label;
mod matcher;
mod time;

pub use board::ArrivalBoard;
pub use label::ArrivalLabel;
pub use matcher::{Arrival, MatchTier, MatcherConfig, PredictionMatcher, TargetStop};
pub use time::{TimeError, minutes_until, resolve_time};
