//! Web layer for the transit arrivals server.
//!
//! A JSON API over the cached transit client, the arrival board and the
//! tile cache, for the map frontend.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
