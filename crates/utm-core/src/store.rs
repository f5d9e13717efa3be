//! Airspace store abstraction consumed by the decision orchestrator.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::StoreError;
use crate::geometry::{GeoJsonExt, GeoJsonGeometry};
use crate::models::{Notice, TimeWindow, WeatherObservation, Zone};
use crate::spatial::BoundingBox;

/// Records returned for one bounding box and time window.
#[derive(Debug, Clone, Default)]
pub struct AirspaceSnapshot {
    pub zones: Vec<Zone>,
    pub notices: Vec<Notice>,
    pub weather: Vec<WeatherObservation>,
}

/// Spatial store of zones, notices and weather observations.
///
/// Implementations return every record whose geometry bounding box intersects `bbox` and
/// whose validity overlaps `window`. Geometry is handed over parsed, but may still be
/// malformed; callers skip what they cannot use.
pub trait AirspaceStore: Send + Sync {
    fn fetch_airspace(
        &self,
        bbox: &BoundingBox,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<AirspaceSnapshot, StoreError>> + Send;
}

/// In-process store backed by plain vectors.
#[derive(Debug, Default)]
pub struct MemoryAirspaceStore {
    zones: Vec<Zone>,
    notices: Vec<Notice>,
    weather: Vec<WeatherObservation>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MemoryAirspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn with_weather(mut self, observation: WeatherObservation) -> Self {
        self.weather.push(observation);
        self
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn snapshot(&self, bbox: &BoundingBox, window: &TimeWindow) -> AirspaceSnapshot {
        // Unparseable geometry has no box; hand it over and let the evaluator skip it.
        let in_box = |geometry: &GeoJsonGeometry| {
            geometry
                .bounding_box()
                .map_or(true, |extent| extent.intersects(bbox))
        };

        AirspaceSnapshot {
            zones: self
                .zones
                .iter()
                .filter(|zone| zone.is_valid_during(window) && in_box(&zone.geometry))
                .cloned()
                .collect(),
            notices: self
                .notices
                .iter()
                .filter(|notice| notice.is_valid_during(window) && in_box(&notice.geometry))
                .cloned()
                .collect(),
            weather: self
                .weather
                .iter()
                .filter(|obs| obs.is_valid_during(window) && bbox.contains(obs.lon, obs.lat))
                .cloned()
                .collect(),
        }
    }
}

impl AirspaceStore for MemoryAirspaceStore {
    fn fetch_airspace(
        &self,
        bbox: &BoundingBox,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<AirspaceSnapshot, StoreError>> + Send {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let result = match &self.failure {
            Some(message) => Err(StoreError::new(message.clone())),
            None => Ok(self.snapshot(bbox, window)),
        };
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoJsonValue;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    fn bbox() -> BoundingBox {
        BoundingBox {
            west: 4.80,
            south: 52.30,
            east: 4.90,
            north: 52.35,
        }
    }

    fn zone(id: i64, lon: f64, lat: f64) -> Zone {
        Zone {
            id,
            name: format!("zone-{id}"),
            geometry: GeoJsonGeometry::new(GeoJsonValue::Point(vec![lon, lat])),
            valid_from: None,
            valid_to: None,
            floor_m: None,
            ceiling_m: None,
        }
    }

    #[tokio::test]
    async fn memory_store_filters_by_box_and_window() {
        let mut expired = zone(3, 4.85, 52.32);
        expired.valid_to = Some(t(8));
        let store = MemoryAirspaceStore::new()
            .with_zone(zone(1, 4.85, 52.32))
            .with_zone(zone(2, 6.00, 52.32))
            .with_zone(expired);

        let snapshot = store
            .fetch_airspace(&bbox(), &TimeWindow::new(t(10), t(11)))
            .await
            .unwrap();
        let ids: Vec<i64> = snapshot.zones.iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn memory_store_keeps_malformed_geometry() {
        let mut broken = zone(9, 4.85, 52.32);
        broken.geometry = GeoJsonGeometry::new(GeoJsonValue::Point(vec![4.85]));
        let store = MemoryAirspaceStore::new().with_zone(broken);
        let snapshot = store
            .fetch_airspace(&bbox(), &TimeWindow::new(t(10), t(11)))
            .await
            .unwrap();
        assert_eq!(snapshot.zones.len(), 1);
    }

    #[tokio::test]
    async fn failing_store_reports_error() {
        let store = MemoryAirspaceStore::failing("connection refused");
        let err = store
            .fetch_airspace(&bbox(), &TimeWindow::at(t(10)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
