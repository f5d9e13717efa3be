//! Minimal WKT reader for the planner feeds.
//!
//! The feeds write positions as `lat lon`; output geometry is GeoJSON `[lon, lat]`.

use utm_core::{GeoJsonGeometry, GeoJsonValue};

/// Parse `POINT`, `LINESTRING` or `POLYGON` text. Anything else, or any unreadable
/// number, yields `None`.
pub fn parse_wkt(raw: &str) -> Option<GeoJsonGeometry> {
    let text = raw.trim();
    let open = text.find('(')?;
    let kind = text[..open].trim().to_ascii_uppercase();
    let body = text[open..].trim();

    match kind.as_str() {
        "POINT" => {
            let inner = strip_parens(body)?;
            let coordinates = parse_position(inner)?;
            Some(GeoJsonGeometry::new(GeoJsonValue::Point(coordinates)))
        }
        "LINESTRING" => {
            let inner = strip_parens(body)?;
            let coordinates = parse_positions(inner)?;
            Some(GeoJsonGeometry::new(GeoJsonValue::LineString(coordinates)))
        }
        "POLYGON" => {
            let inner = strip_parens(body)?;
            let rings = split_rings(inner)?
                .into_iter()
                .map(parse_positions)
                .collect::<Option<Vec<_>>>()?;
            if rings.is_empty() {
                return None;
            }
            Some(GeoJsonGeometry::new(GeoJsonValue::Polygon(rings)))
        }
        _ => None,
    }
}

fn strip_parens(body: &str) -> Option<&str> {
    body.strip_prefix('(')?.strip_suffix(')').map(str::trim)
}

/// Split `(a, b), (c, d)` into ring bodies.
fn split_rings(inner: &str) -> Option<Vec<&str>> {
    let mut rings = Vec::new();
    let mut rest = inner.trim();
    while !rest.is_empty() {
        let body = rest.strip_prefix('(')?;
        let close = body.find(')')?;
        rings.push(body[..close].trim());
        rest = body[close + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Some(rings)
}

fn parse_positions(list: &str) -> Option<Vec<Vec<f64>>> {
    list.split(',').map(parse_position).collect()
}

/// `lat lon` to `[lon, lat]`.
fn parse_position(pair: &str) -> Option<Vec<f64>> {
    let mut parts = pair.split_whitespace();
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(vec![lon, lat])
}
