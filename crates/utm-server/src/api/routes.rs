//! REST API routes.

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{airspace, flight_requests, request_id};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(|| async { "OK" }))
        .route("/v1/flight-requests", post(flight_requests::create_flight_request))
        .route("/v1/zones", get(airspace::list_zones))
        .route("/v1/notams", get(airspace::list_notams))
        .route("/v1/weather", get(airspace::list_weather))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "UTM backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
