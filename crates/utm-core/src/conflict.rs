//! Conflict evaluation between a flight corridor and airspace records.
//!
//! Records are first filtered on validity against the flight window, then tested for
//! planar intersection with the corridor. Zones and `hard` notices block the flight;
//! other notices and strong wind are advisory.

use geo::{Intersects, Polygon};
use serde::{Deserialize, Serialize};

use crate::geometry::{GeoJsonExt, GeoJsonGeometry};
use crate::models::{
    Notice, Reason, TimeWindow, WeatherObservation, Zone, CODE_AIRSPACE_RESTRICTED,
    CODE_WEATHER_WIND,
};
use crate::spatial::BoundingBox;

/// Conflicts found for one flight, in emission order (zones, notices, weather).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub blocking: Vec<Reason>,
    pub advisory: Vec<Reason>,
}

impl ConflictReport {
    pub fn has_blocking(&self) -> bool {
        !self.blocking.is_empty()
    }

    pub fn has_advisory(&self) -> bool {
        !self.advisory.is_empty()
    }
}

/// Evaluates airspace records against one corridor and time window.
pub struct ConflictEvaluator<'a> {
    corridor: &'a Polygon<f64>,
    bbox: BoundingBox,
    window: TimeWindow,
    /// Wind above this is advisory (knots)
    pub wind_limit_kts: f64,
}

impl<'a> ConflictEvaluator<'a> {
    pub fn new(
        corridor: &'a Polygon<f64>,
        bbox: BoundingBox,
        window: TimeWindow,
        wind_limit_kts: f64,
    ) -> Self {
        Self {
            corridor,
            bbox,
            window,
            wind_limit_kts,
        }
    }

    /// Classify every record into blocking and advisory reasons.
    pub fn evaluate(
        &self,
        zones: &[Zone],
        notices: &[Notice],
        weather: &[WeatherObservation],
    ) -> ConflictReport {
        let mut report = ConflictReport::default();
        self.check_zones(zones, &mut report);
        self.check_notices(notices, &mut report);
        self.check_weather(weather, &mut report);
        report
    }

    fn check_zones(&self, zones: &[Zone], report: &mut ConflictReport) {
        for zone in zones {
            if !zone.is_valid_during(&self.window) {
                continue;
            }
            if self.intersects_corridor(&zone.geometry, "zone", zone.id) {
                report
                    .blocking
                    .push(Reason::new(CODE_AIRSPACE_RESTRICTED, zone.name.clone()));
            }
        }
    }

    fn check_notices(&self, notices: &[Notice], report: &mut ConflictReport) {
        for notice in notices {
            if !notice.is_valid_during(&self.window) {
                continue;
            }
            if !self.intersects_corridor(&notice.geometry, "notice", notice.id) {
                continue;
            }
            let reason = Reason::new(notice.reason_code(), notice.title.clone());
            if notice.is_hard() {
                report.blocking.push(reason);
            } else {
                report.advisory.push(reason);
            }
        }
    }

    /// At most one wind reason per evaluation: the first offending observation wins.
    fn check_weather(&self, weather: &[WeatherObservation], report: &mut ConflictReport) {
        let offending = weather.iter().find(|obs| {
            self.bbox.contains(obs.lon, obs.lat)
                && obs.is_valid_during(&self.window)
                && obs.wind_speed_kts > self.wind_limit_kts
        });
        if let Some(obs) = offending {
            report.advisory.push(Reason::new(
                CODE_WEATHER_WIND,
                format!("Wind {}kt > {}", obs.wind_speed_kts, self.wind_limit_kts),
            ));
        }
    }

    /// Malformed geometry counts as non-intersecting.
    fn intersects_corridor(&self, geometry: &GeoJsonGeometry, kind: &str, id: i64) -> bool {
        match geometry.to_geo() {
            Some(geometry) => geometry.intersects(self.corridor),
            None => {
                tracing::debug!("Skipping {} {} with malformed geometry", kind, id);
                false
            }
        }
    }
}
