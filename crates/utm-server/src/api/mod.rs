//! HTTP API for the UTM server.

pub mod airspace;
pub mod error;
pub mod flight_requests;
pub mod request_id;
mod routes;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}
