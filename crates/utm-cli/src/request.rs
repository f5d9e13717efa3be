//! Flight request construction and submission.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use utm_core::{Decision, FlightRequest, GeoJsonGeometry, GeoJsonValue};

/// Parse `lon,lat` into a GeoJSON position.
pub fn parse_position(raw: &str) -> Result<Vec<f64>> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [lon, lat] = parts.as_slice() else {
        bail!("expected 'lon,lat', got '{}'", raw);
    };
    let lon: f64 = lon.parse().with_context(|| format!("bad longitude in '{}'", raw))?;
    let lat: f64 = lat.parse().with_context(|| format!("bad latitude in '{}'", raw))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        bail!("position '{}' is out of range", raw);
    }
    Ok(vec![lon, lat])
}

/// Request for a route `from -> via... -> to` starting at `start` for `duration_min`.
pub fn build_flight_request(
    from: &str,
    via: &[String],
    to: &str,
    start: DateTime<Utc>,
    duration_min: i64,
    drone_id: Option<String>,
    operator_id: Option<String>,
) -> Result<FlightRequest> {
    if duration_min < 0 {
        bail!("duration must not be negative");
    }
    let mut coordinates = vec![parse_position(from)?];
    for waypoint in via {
        coordinates.push(parse_position(waypoint)?);
    }
    coordinates.push(parse_position(to)?);

    Ok(FlightRequest {
        operator_id,
        drone_id,
        purpose: None,
        time_start: start,
        time_end: start + Duration::minutes(duration_min),
        route: GeoJsonGeometry::new(GeoJsonValue::LineString(coordinates)),
    })
}

/// POST the request and decode the decision. Error responses carry the server's message.
pub async fn submit_flight_request(
    client: &reqwest::Client,
    base_url: &str,
    request: &FlightRequest,
) -> Result<Decision> {
    let url = format!("{}/v1/flight-requests", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(request)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("no error message");
        bail!("server returned {}: {}", status, message);
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_lon_lat_pairs() {
        assert_eq!(parse_position("4.80, 52.30").unwrap(), vec![4.80, 52.30]);
        assert!(parse_position("4.80").is_err());
        assert!(parse_position("4.80,52.30,10").is_err());
        assert!(parse_position("200,52.30").is_err());
        assert!(parse_position("east,52.30").is_err());
    }

    #[test]
    fn builds_route_with_waypoints() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let request = build_flight_request(
            "4.80,52.30",
            &["4.85,52.33".to_string()],
            "4.90,52.35",
            start,
            45,
            Some("drone-1".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(request.time_end, start + Duration::minutes(45));
        assert_eq!(
            request.route,
            GeoJsonGeometry::new(GeoJsonValue::LineString(vec![
                vec![4.80, 52.30],
                vec![4.85, 52.33],
                vec![4.90, 52.35],
            ]))
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["droneId"], "drone-1");
        assert_eq!(body["route"]["type"], "LineString");
    }
}
