//! Core data models for flight-request decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::GeoJsonGeometry;

/// Closed time interval `[start, end]` for a requested flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Zero-length window at a single instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            start: instant,
            end: instant,
        }
    }

    /// Overlap test against an interval whose bounds may be open.
    pub fn overlaps(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
        from.map_or(true, |from| from <= self.end) && to.map_or(true, |to| to >= self.start)
    }
}

// ========== AIRSPACE RECORDS ==========

/// Restricted zone. Always blocking, and the only kind of planning obstacle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub geometry: GeoJsonGeometry,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    /// Floor in meters, informational only
    #[serde(default)]
    pub floor_m: Option<f64>,
    /// Ceiling in meters, informational only
    #[serde(default)]
    pub ceiling_m: Option<f64>,
}

impl Zone {
    pub fn is_valid_during(&self, window: &TimeWindow) -> bool {
        window.overlaps(self.valid_from, self.valid_to)
    }
}

/// Notice to airmen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    /// `hard` notices block; anything else is advisory
    #[serde(default = "default_severity")]
    pub severity: String,
    pub geometry: GeoJsonGeometry,
    pub start: DateTime<Utc>,
    /// Open-ended when absent
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

pub const HARD_SEVERITY: &str = "hard";

fn default_severity() -> String {
    HARD_SEVERITY.to_string()
}

impl Notice {
    pub fn is_valid_during(&self, window: &TimeWindow) -> bool {
        window.overlaps(Some(self.start), self.end)
    }

    /// Severity tag, with an empty tag read as `hard`.
    pub fn effective_severity(&self) -> &str {
        if self.severity.is_empty() {
            HARD_SEVERITY
        } else {
            &self.severity
        }
    }

    pub fn is_hard(&self) -> bool {
        self.effective_severity() == HARD_SEVERITY
    }

    pub fn reason_code(&self) -> String {
        format!("NOTAM_{}", self.effective_severity().to_uppercase())
    }
}

/// Point weather observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub wind_speed_kts: f64,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
}

impl WeatherObservation {
    pub fn is_valid_during(&self, window: &TimeWindow) -> bool {
        window.overlaps(Some(self.observed_at), self.valid_to)
    }
}

// ========== DECISIONS ==========

pub const CODE_AIRSPACE_RESTRICTED: &str = "AIRSPACE_RESTRICTED";
pub const CODE_WEATHER_WIND: &str = "WEATHER_WIND";

/// A conflict explanation attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub code: String,
    pub detail: String,
}

impl Reason {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Approved,
    Rejected,
    Alternative,
}

/// Outcome of a flight request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub decision: DecisionKind,
    pub reasons: Vec<Reason>,
    /// Replacement route, only for `alternative`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_route: Option<GeoJsonGeometry>,
}

impl Decision {
    pub fn approved() -> Self {
        Self {
            decision: DecisionKind::Approved,
            reasons: Vec::new(),
            alternative_route: None,
        }
    }

    pub fn rejected(reasons: Vec<Reason>) -> Self {
        Self {
            decision: DecisionKind::Rejected,
            reasons,
            alternative_route: None,
        }
    }

    pub fn alternative(reasons: Vec<Reason>, route: GeoJsonGeometry) -> Self {
        Self {
            decision: DecisionKind::Alternative,
            reasons,
            alternative_route: Some(route),
        }
    }
}

/// Flight request submitted by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRequest {
    #[serde(default)]
    pub operator_id: Option<String>,
    #[serde(default)]
    pub drone_id: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub route: GeoJsonGeometry,
}
