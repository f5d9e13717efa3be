//! Flight-request decisions: evaluate conflicts, then approve, reject or reroute.

use geo::Geometry;

use crate::conflict::ConflictEvaluator;
use crate::error::DecisionError;
use crate::geometry::{geojson_line, GeoJsonExt};
use crate::models::{Decision, FlightRequest, TimeWindow, Zone};
use crate::route_engine::plan_alternative_route;
use crate::rules::DecisionConfig;
use crate::spatial::{build_corridor, route_coords, BoundingBox};
use crate::store::AirspaceStore;

/// Decide whether `request` may fly as filed.
///
/// Blocking conflicts always reject. Advisory conflicts trigger a replanning attempt
/// around zones; when no route is found the advisory reasons reject the flight.
/// Input is validated before the store is queried.
pub async fn decide_flight<S: AirspaceStore>(
    store: &S,
    config: &DecisionConfig,
    request: &FlightRequest,
) -> Result<Decision, DecisionError> {
    let route = route_coords(&request.route)?;
    if request.time_end < request.time_start {
        return Err(DecisionError::InvalidInput(format!(
            "timeEnd {} is before timeStart {}",
            request.time_end, request.time_start
        )));
    }
    let window = TimeWindow::new(request.time_start, request.time_end);

    let corridor = build_corridor(&route, config.corridor_width_m)?;
    let bbox = BoundingBox::from_coords(&route)
        .ok_or_else(|| DecisionError::InvalidInput("route is empty".to_string()))?;

    let snapshot = store.fetch_airspace(&bbox, &window).await?;
    tracing::debug!(
        "Evaluating flight for drone {:?}: {} zones, {} notices, {} weather observations",
        request.drone_id,
        snapshot.zones.len(),
        snapshot.notices.len(),
        snapshot.weather.len()
    );

    let report = ConflictEvaluator::new(&corridor, bbox, window, config.wind_limit_kts).evaluate(
        &snapshot.zones,
        &snapshot.notices,
        &snapshot.weather,
    );

    if report.has_blocking() {
        tracing::info!(
            "Rejecting flight for drone {:?}: {} blocking conflicts",
            request.drone_id,
            report.blocking.len()
        );
        return Ok(Decision::rejected(report.blocking));
    }
    if !report.has_advisory() {
        return Ok(Decision::approved());
    }

    let obstacles = planning_obstacles(&snapshot.zones, &window);
    match plan_alternative_route(&route, &bbox, &obstacles, config) {
        Some(planned) => {
            tracing::info!(
                "Alternative route for drone {:?}: {} grid nodes, {} visited, {} blocked",
                request.drone_id,
                planned.grid_nodes,
                planned.nodes_visited,
                planned.blocked_nodes
            );
            Ok(Decision::alternative(
                report.advisory,
                geojson_line(&planned.route),
            ))
        }
        None => {
            tracing::info!(
                "No alternative route for drone {:?}; rejecting on advisory conflicts",
                request.drone_id
            );
            Ok(Decision::rejected(report.advisory))
        }
    }
}

/// Zones valid during the window, as planar geometry. Notices and weather never block
/// planning.
fn planning_obstacles(zones: &[Zone], window: &TimeWindow) -> Vec<Geometry<f64>> {
    zones
        .iter()
        .filter(|zone| zone.is_valid_during(window))
        .filter_map(|zone| zone.geometry.to_geo())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionKind, Notice, Reason, WeatherObservation};
    use crate::geometry::{geojson_polygon, GeoJsonGeometry, GeoJsonValue};
    use crate::spatial::buffer_point;
    use crate::store::MemoryAirspaceStore;
    use chrono::{DateTime, TimeZone, Utc};
    use geo::{Coord, Intersects, Point};

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    fn request(route: Vec<Vec<f64>>) -> FlightRequest {
        FlightRequest {
            operator_id: Some("op-1".to_string()),
            drone_id: Some("drone-1".to_string()),
            purpose: Some("inspection".to_string()),
            time_start: t(10),
            time_end: t(11),
            route: GeoJsonGeometry::new(GeoJsonValue::LineString(route)),
        }
    }

    fn amsterdam() -> FlightRequest {
        request(vec![vec![4.80, 52.30], vec![4.90, 52.35]])
    }

    fn square(west: f64, south: f64, east: f64, north: f64) -> GeoJsonGeometry {
        GeoJsonGeometry::new(GeoJsonValue::Polygon(vec![vec![
            vec![west, south],
            vec![east, south],
            vec![east, north],
            vec![west, north],
            vec![west, south],
        ]]))
    }

    fn zone(id: i64, name: &str, geometry: GeoJsonGeometry) -> Zone {
        Zone {
            id,
            name: name.to_string(),
            geometry,
            valid_from: None,
            valid_to: None,
            floor_m: None,
            ceiling_m: None,
        }
    }

    fn disc_zone(id: i64, lon: f64, lat: f64, radius_m: f64) -> Zone {
        let disc = buffer_point(Coord { x: lon, y: lat }, radius_m);
        zone(id, &format!("Disc {id}"), geojson_polygon(&disc))
    }

    fn notice(id: i64, title: &str, severity: &str, geometry: GeoJsonGeometry) -> Notice {
        Notice {
            id,
            title: title.to_string(),
            severity: severity.to_string(),
            geometry,
            start: t(0),
            end: None,
        }
    }

    fn wind(id: i64, kts: f64) -> WeatherObservation {
        WeatherObservation {
            id,
            lat: 52.32,
            lon: 4.85,
            wind_speed_kts: kts,
            observed_at: t(9),
            valid_to: None,
            temperature_c: Some(12.0),
            wind_direction_deg: Some(240.0),
            condition: None,
        }
    }

    fn line_coords(geometry: &GeoJsonGeometry) -> Vec<Coord<f64>> {
        let GeoJsonValue::LineString(coordinates) = &geometry.value else {
            panic!("expected LineString, got {}", geometry.type_name());
        };
        coordinates
            .iter()
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect()
    }

    async fn decide(store: &MemoryAirspaceStore, request: &FlightRequest) -> Decision {
        decide_flight(store, &DecisionConfig::default(), request)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_airspace_is_approved() {
        let store = MemoryAirspaceStore::new();
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(decision, Decision::approved());
    }

    #[tokio::test]
    async fn covering_zone_rejects() {
        let store = MemoryAirspaceStore::new().with_zone(zone(
            1,
            "Schiphol CTR",
            square(4.70, 52.20, 5.00, 52.45),
        ));
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(
            decision,
            Decision::rejected(vec![Reason::new("AIRSPACE_RESTRICTED", "Schiphol CTR")])
        );
    }

    #[tokio::test]
    async fn soft_notice_yields_alternative_route() {
        let store = MemoryAirspaceStore::new().with_notice(notice(
            4,
            "Crane works",
            "soft",
            square(4.84, 52.31, 4.86, 52.33),
        ));
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(decision.decision, DecisionKind::Alternative);
        assert_eq!(decision.reasons, vec![Reason::new("NOTAM_SOFT", "Crane works")]);

        let route = line_coords(decision.alternative_route.as_ref().unwrap());
        assert!(route.len() >= 2);
        assert!((route[0].x - 4.80).abs() < 1e-9 && (route[0].y - 52.30).abs() < 1e-9);
        let last = route[route.len() - 1];
        assert!((last.x - 4.90).abs() < 1e-9 && (last.y - 52.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn blocking_reasons_dominate_advisory_ones() {
        let store = MemoryAirspaceStore::new()
            .with_zone(zone(1, "Restricted", square(4.84, 52.31, 4.86, 52.33)))
            .with_notice(notice(2, "Crane works", "soft", square(4.84, 52.31, 4.86, 52.33)))
            .with_weather(wind(1, 40.0));
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(decision.decision, DecisionKind::Rejected);
        assert_eq!(
            decision.reasons,
            vec![Reason::new("AIRSPACE_RESTRICTED", "Restricted")]
        );
        assert!(decision.alternative_route.is_none());
    }

    #[tokio::test]
    async fn hard_notice_rejects() {
        let store = MemoryAirspaceStore::new().with_notice(notice(
            2,
            "Air show",
            "hard",
            square(4.84, 52.31, 4.86, 52.33),
        ));
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(
            decision,
            Decision::rejected(vec![Reason::new("NOTAM_HARD", "Air show")])
        );
    }

    #[tokio::test]
    async fn alternative_route_avoids_zones_off_the_corridor() {
        // Discs north-west of the diagonal, well clear of the 50 m corridor.
        let zones = [
            disc_zone(1, 4.82, 52.34, 400.0),
            disc_zone(2, 4.83, 52.345, 300.0),
        ];
        let mut store = MemoryAirspaceStore::new().with_weather(wind(1, 32.0));
        for zone in zones.iter().cloned() {
            store = store.with_zone(zone);
        }

        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(decision.decision, DecisionKind::Alternative);
        assert_eq!(
            decision.reasons,
            vec![Reason::new("WEATHER_WIND", "Wind 32kt > 25")]
        );

        let route = line_coords(decision.alternative_route.as_ref().unwrap());
        let obstacles: Vec<Geometry<f64>> =
            zones.iter().filter_map(|z| z.geometry.to_geo()).collect();
        for pair in route.windows(2) {
            for i in 0..=50 {
                let t = i as f64 / 50.0;
                let sample = Point::new(
                    pair[0].x + t * (pair[1].x - pair[0].x),
                    pair[0].y + t * (pair[1].y - pair[0].y),
                );
                assert!(obstacles.iter().all(|o| !o.intersects(&sample)));
            }
        }
    }

    #[tokio::test]
    async fn enclosed_start_rejects_with_advisory_reasons() {
        // Three-leg grid (4 steps) where the first leg runs between the start's
        // neighbours; tiny discs on those neighbours trap the start without touching
        // the corridor.
        let request = request(vec![
            vec![4.80, 52.30],
            vec![4.84, 52.31],
            vec![4.80, 52.32],
        ]);
        let store = MemoryAirspaceStore::new()
            .with_zone(disc_zone(1, 4.81, 52.30, 30.0))
            .with_zone(disc_zone(2, 4.81, 52.305, 30.0))
            .with_zone(disc_zone(3, 4.80, 52.305, 30.0))
            .with_notice(notice(5, "Survey", "soft", square(4.835, 52.305, 4.845, 52.315)));
        let config = DecisionConfig {
            grid_steps: 4,
            ..DecisionConfig::default()
        };

        let decision = decide_flight(&store, &config, &request).await.unwrap();
        assert_eq!(
            decision,
            Decision::rejected(vec![Reason::new("NOTAM_SOFT", "Survey")])
        );
    }

    #[tokio::test]
    async fn notices_are_not_planning_obstacles() {
        // A soft notice covering the whole box would leave no free node if it blocked
        // planning; it only contributes an advisory reason.
        let store = MemoryAirspaceStore::new().with_notice(notice(
            6,
            "Regional advisory",
            "soft",
            square(4.70, 52.20, 5.00, 52.45),
        ));
        let decision = decide(&store, &amsterdam()).await;
        assert_eq!(decision.decision, DecisionKind::Alternative);
        assert!(decision.alternative_route.is_some());
    }

    #[tokio::test]
    async fn wind_reason_appears_once() {
        let store = MemoryAirspaceStore::new()
            .with_weather(wind(1, 30.0))
            .with_weather(wind(2, 45.0));
        let decision = decide(&store, &amsterdam()).await;
        let wind_reasons = decision
            .reasons
            .iter()
            .filter(|r| r.code == "WEATHER_WIND")
            .count();
        assert_eq!(wind_reasons, 1);
    }

    #[tokio::test]
    async fn invalid_route_fails_before_store_access() {
        let store = MemoryAirspaceStore::failing("should not be queried");
        let err = decide_flight(
            &store,
            &DecisionConfig::default(),
            &request(vec![vec![4.80, 52.30]]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput(_)));
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn reversed_window_is_invalid() {
        let store = MemoryAirspaceStore::new();
        let mut request = amsterdam();
        request.time_end = t(9);
        let err = decide_flight(&store, &DecisionConfig::default(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn store_failure_is_upstream_error() {
        let store = MemoryAirspaceStore::failing("database is locked");
        let err = decide_flight(&store, &DecisionConfig::default(), &amsterdam())
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::UpstreamUnavailable(_)));
    }
}
