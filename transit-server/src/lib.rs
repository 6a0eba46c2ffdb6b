//! Transit arrivals server.
//!
//! Serves subway line maps and live arrival predictions from the MBTA V3
//! API: slowly-changing entities through a persistent TTL cache,
//! predictions live and matched to the rider's stop, and map tiles from
//! an offline store.

pub mod cache;
pub mod domain;
pub mod gateway;
pub mod predictions;
pub mod tiles;
pub mod web;
