//! Spatial helpers: corridors, bounding boxes, simplification and metre/degree scaling.
//!
//! All geometry is planar in (longitude, latitude) degrees. Buffers are built in a local
//! east/north metre frame and converted back with latitude-aware scaling.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon, Simplify};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry::{position_to_coord, GeoJsonExt, GeoJsonGeometry, GeoJsonValue};

/// Fixed metres-per-degree factor used to express simplification tolerances in degrees.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Vertices per half circle on corridor caps and joins.
const CAP_SEGMENTS: usize = 16;
/// Vertices on a full disc buffer.
const DISC_SEGMENTS: usize = 64;

/// Axis-aligned (west, south, east, north) extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Minimal box enclosing all coordinates, `None` for an empty slice.
    pub fn from_coords(coords: &[Coord<f64>]) -> Option<Self> {
        let first = coords.first()?;
        let mut bbox = BoundingBox {
            west: first.x,
            south: first.y,
            east: first.x,
            north: first.y,
        };
        for c in &coords[1..] {
            bbox.west = bbox.west.min(c.x);
            bbox.south = bbox.south.min(c.y);
            bbox.east = bbox.east.max(c.x);
            bbox.north = bbox.north.max(c.y);
        }
        Some(bbox)
    }

    /// Parse a `"w,s,e,n"` query string.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<f64> = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [west, south, east, north]
                if parts.iter().all(|v| v.is_finite()) && west <= east && south <= north =>
            {
                Some(BoundingBox {
                    west: *west,
                    south: *south,
                    east: *east,
                    north: *north,
                })
            }
            _ => None,
        }
    }

    /// Boundary-inclusive point test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }
}

/// Parse a GeoJSON route into at least two finite coordinates.
pub fn route_coords(route: &GeoJsonGeometry) -> Result<Vec<Coord<f64>>, GeometryError> {
    let GeoJsonValue::LineString(coordinates) = &route.value else {
        return Err(GeometryError::InvalidGeometry(format!(
            "route must be a LineString, got {}",
            route.type_name()
        )));
    };
    let coords = coordinates
        .iter()
        .enumerate()
        .map(|(idx, position)| {
            position_to_coord(position).ok_or_else(|| {
                GeometryError::InvalidGeometry(format!(
                    "route position {idx} is not a numeric [lon, lat] pair"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if coords.len() < 2 {
        return Err(GeometryError::InvalidGeometry(format!(
            "route needs at least 2 positions, got {}",
            coords.len()
        )));
    }
    Ok(coords)
}

/// Buffer a route line by `width_m` on each side with round caps and joins.
pub fn build_corridor(route: &[Coord<f64>], width_m: f64) -> Result<Polygon<f64>, GeometryError> {
    if route.len() < 2 {
        return Err(GeometryError::InvalidGeometry(
            "corridor needs at least 2 positions".to_string(),
        ));
    }
    if route.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::InvalidGeometry(
            "corridor positions must be finite".to_string(),
        ));
    }
    if !width_m.is_finite() || width_m <= 0.0 {
        return Err(GeometryError::InvalidGeometry(format!(
            "corridor width must be positive, got {width_m}"
        )));
    }

    let ref_lat = route.iter().map(|c| c.y).sum::<f64>() / route.len() as f64;
    let mut capsules = route
        .windows(2)
        .map(|pair| segment_capsule(pair[0], pair[1], width_m, ref_lat));

    let Some(first) = capsules.next() else {
        return Err(GeometryError::InvalidGeometry("route has no segments".to_string()));
    };
    if route.len() == 2 {
        return Ok(first);
    }

    let mut merged = MultiPolygon::new(vec![first]);
    for capsule in capsules {
        merged = merged.union(&MultiPolygon::new(vec![capsule]));
    }

    // Consecutive capsules share a cap disc, so the union is a single polygon in practice.
    merged
        .0
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .ok_or_else(|| GeometryError::InvalidGeometry("corridor union is empty".to_string()))
}

/// Disc of `radius_m` around a point.
pub fn buffer_point(center: Coord<f64>, radius_m: f64) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..DISC_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f64 / DISC_SEGMENTS as f64;
            offset_coord(center, radius_m * angle.cos(), radius_m * angle.sin(), center.y)
        })
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}

/// Douglas-Peucker simplification with a tolerance in metres.
pub fn simplify(line: &LineString<f64>, tolerance_m: f64) -> LineString<f64> {
    let epsilon = tolerance_m / METERS_PER_DEGREE;
    line.simplify(&epsilon)
}

/// Stadium-shaped polygon around one route segment.
fn segment_capsule(a: Coord<f64>, b: Coord<f64>, width_m: f64, ref_lat: f64) -> Polygon<f64> {
    let dx = lon_to_meters(b.x - a.x, ref_lat);
    let dy = lat_to_meters(b.y - a.y, ref_lat);
    let heading = if dx.hypot(dy) > f64::EPSILON {
        dy.atan2(dx)
    } else {
        0.0
    };

    let mut ring = Vec::with_capacity(2 * (CAP_SEGMENTS + 1));
    // Front cap around `b`, left side to right side.
    for i in 0..=CAP_SEGMENTS {
        let angle = heading + FRAC_PI_2 - PI * i as f64 / CAP_SEGMENTS as f64;
        ring.push(offset_coord(b, width_m * angle.cos(), width_m * angle.sin(), ref_lat));
    }
    // Back cap around `a`, right side to left side.
    for i in 0..=CAP_SEGMENTS {
        let angle = heading - FRAC_PI_2 - PI * i as f64 / CAP_SEGMENTS as f64;
        ring.push(offset_coord(a, width_m * angle.cos(), width_m * angle.sin(), ref_lat));
    }
    Polygon::new(LineString::new(ring), vec![])
}

fn offset_coord(origin: Coord<f64>, east_m: f64, north_m: f64, ref_lat: f64) -> Coord<f64> {
    Coord {
        x: origin.x + meters_to_lon(east_m, ref_lat),
        y: origin.y + meters_to_lat(north_m, ref_lat),
    }
}

// ==== ENU (East-North-Up) Coordinate Conversion ====
// These functions convert between meters and degrees using latitude-aware scaling.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lat(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert an east/west offset in meters to degrees longitude.
/// Requires the reference latitude for proper scaling.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lon(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert degrees latitude to meters using local scaling.
pub fn lat_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * meters_per_deg_lat(ref_lat_deg)
}

/// Convert degrees longitude to meters at a given latitude.
pub fn lon_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * meters_per_deg_lon(ref_lat_deg)
}
