//! Airspace query endpoints: zones, notams and weather for a bounding box.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utm_core::{BoundingBox, GeoJsonGeometry, TimeWindow, WeatherObservation};

use super::error::ApiError;
use crate::persistence::{notams, weather, zones};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AirspaceQuery {
    /// `west,south,east,north`
    pub bbox: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC); defaults to now
    pub time: Option<String>,
}

impl AirspaceQuery {
    fn resolve(&self) -> Result<(BoundingBox, TimeWindow), ApiError> {
        let raw = self.bbox.as_deref().unwrap_or_default();
        let bbox = BoundingBox::parse(raw)
            .ok_or_else(|| ApiError::bad_request("Invalid bbox; expected \"w,s,e,n\""))?;
        let instant = match self.time.as_deref() {
            Some(raw) => parse_query_time(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Invalid time '{}'", raw)))?,
            None => Utc::now(),
        };
        Ok((bbox, TimeWindow::at(instant)))
    }
}

fn parse_query_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn feature(properties: Value, geometry: &GeoJsonGeometry) -> Value {
    json!({ "type": "Feature", "properties": properties, "geometry": geometry })
}

/// Zones active at `time` as a GeoJSON FeatureCollection.
pub async fn list_zones(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AirspaceQuery>,
) -> Result<Json<Value>, ApiError> {
    let (bbox, window) = query.resolve()?;
    let mut conn = state
        .db()
        .pool()
        .acquire()
        .await
        .map_err(|err| ApiError::internal(err.into()))?;
    let zones = zones::zones_in_box(&mut *conn, &bbox, &window)
        .await
        .map_err(ApiError::internal)?;

    let features: Vec<Value> = zones
        .iter()
        .map(|zone| feature(json!({ "id": zone.id, "name": zone.name }), &zone.geometry))
        .collect();
    Ok(Json(json!({ "type": "FeatureCollection", "features": features })))
}

/// Notams active at `time` as a GeoJSON FeatureCollection.
pub async fn list_notams(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AirspaceQuery>,
) -> Result<Json<Value>, ApiError> {
    let (bbox, window) = query.resolve()?;
    let mut conn = state
        .db()
        .pool()
        .acquire()
        .await
        .map_err(|err| ApiError::internal(err.into()))?;
    let notices = notams::notams_in_box(&mut *conn, &bbox, &window)
        .await
        .map_err(ApiError::internal)?;

    let features: Vec<Value> = notices
        .iter()
        .map(|notice| {
            feature(
                json!({ "id": notice.id, "title": notice.title, "severity": notice.severity }),
                &notice.geometry,
            )
        })
        .collect();
    Ok(Json(json!({ "type": "FeatureCollection", "features": features })))
}

/// Weather observation as served to map clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationView {
    pub lat: f64,
    pub lng: f64,
    pub temp_c: Option<f64>,
    pub wind_kts: f64,
    pub wind_dir: Option<f64>,
    pub phenomena: Option<String>,
}

impl From<WeatherObservation> for ObservationView {
    fn from(obs: WeatherObservation) -> Self {
        Self {
            lat: obs.lat,
            lng: obs.lon,
            temp_c: obs.temperature_c,
            wind_kts: obs.wind_speed_kts,
            wind_dir: obs.wind_direction_deg,
            phenomena: obs.condition,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub updated: DateTime<Utc>,
    pub observations: Vec<ObservationView>,
}

/// Weather observations inside the box and valid at `time`.
pub async fn list_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AirspaceQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let (bbox, window) = query.resolve()?;
    let mut conn = state
        .db()
        .pool()
        .acquire()
        .await
        .map_err(|err| ApiError::internal(err.into()))?;
    let observations = weather::observations_in_box(&mut *conn, &bbox, &window)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(WeatherResponse {
        updated: Utc::now(),
        observations: observations.into_iter().map(ObservationView::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_time_accepts_both_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_query_time("2026-05-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_query_time("2026-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_query_time("2026-05-01 10:00:00"), Some(expected));
        assert_eq!(parse_query_time("yesterday"), None);
    }

    #[test]
    fn missing_bbox_is_bad_request() {
        let query = AirspaceQuery {
            bbox: None,
            time: None,
        };
        let err = query.resolve().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
