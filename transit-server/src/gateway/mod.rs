//! Remote data gateway for the transit V3 API.
//!
//! The upstream API speaks JSON:API: each response has primary `data` and
//! optionally side-loaded `included` resources. This module decodes those
//! documents, converts resources into typed entities (skipping malformed
//! ones), and merges related entities with duplicate ids removed.
//!
//! Multi-route fetches issue one request per route concurrently; one
//! route failing only loses that route's contribution.

mod api;
mod client;
mod convert;
mod error;
mod shapes;
mod types;

pub use api::TransitApi;
pub use client::{GatewayConfig, TransitClient};
pub use convert::convert_all;
pub use error::{ConversionError, GatewayError};
pub use shapes::ShapeSelection;
pub use types::{Document, Resource};
