//! Core transit types.
//!
//! Entities are plain typed records with explicit optional fields.
//! Relationships between them are id strings, never owned references.

mod aliases;
mod entities;
mod index;

pub use aliases::{DEFAULT_ALIASES, RouteAlias, RouteAliases};
pub use entities::{
    Alert, Facility, Identified, Line, Prediction, PredictionBatch, Route, RouteCollection, Shape,
    Stop,
};
pub use index::{EntitySet, index_by_id};
