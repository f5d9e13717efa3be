//! Flight-request decision endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;
use utm_core::{decide_flight, Decision, FlightRequest};

use super::error::ApiError;
use super::request_id::RequestId;
use crate::state::AppState;

/// Decide a flight request: approved, rejected or an alternative route.
///
/// 400 for malformed requests, 502 when the airspace store cannot be read.
pub async fn create_flight_request(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Json<FlightRequest>, JsonRejection>,
) -> Result<Json<Decision>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let decision = decide_flight(state.store(), &state.config().decision, &request).await?;
    tracing::info!(
        request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str()).unwrap_or("-"),
        operator = request.operator_id.as_deref().unwrap_or("-"),
        drone = request.drone_id.as_deref().unwrap_or("-"),
        "Flight request decided: {:?} with {} reasons",
        decision.decision,
        decision.reasons.len()
    );
    Ok(Json(decision))
}
