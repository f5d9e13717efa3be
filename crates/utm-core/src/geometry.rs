//! GeoJSON geometry as carried on the wire and in the airspace store.
//!
//! Geometries are plain `geojson` values. Conversion to planar `geo` types is checked here
//! instead of going through the `geojson` crate's conversions, which index positions
//! without checking their length: a malformed record must fail the conversion, not panic.

use geo::{BoundingRect, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};

pub use geojson::{Geometry as GeoJsonGeometry, Value as GeoJsonValue};

use crate::spatial::BoundingBox;

/// Planar views of a GeoJSON geometry.
pub trait GeoJsonExt {
    /// Convert to planar geometry, or `None` if any position is malformed or the type is
    /// not one the service stores.
    fn to_geo(&self) -> Option<Geometry<f64>>;

    /// Bounding box of a well-formed geometry.
    fn bounding_box(&self) -> Option<BoundingBox>;

    fn type_name(&self) -> &'static str;
}

impl GeoJsonExt for GeoJsonGeometry {
    fn to_geo(&self) -> Option<Geometry<f64>> {
        match &self.value {
            GeoJsonValue::Point(position) => {
                position_to_coord(position).map(|c| Geometry::Point(Point::from(c)))
            }
            GeoJsonValue::LineString(positions) => {
                let line = positions_to_line(positions)?;
                if line.0.len() < 2 {
                    return None;
                }
                Some(Geometry::LineString(line))
            }
            GeoJsonValue::Polygon(rings) => rings_to_polygon(rings).map(Geometry::Polygon),
            GeoJsonValue::MultiPolygon(polygons) => {
                let polygons = polygons
                    .iter()
                    .map(|rings| rings_to_polygon(rings))
                    .collect::<Option<Vec<_>>>()?;
                if polygons.is_empty() {
                    return None;
                }
                Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
            }
            _ => None,
        }
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        let rect = self.to_geo()?.bounding_rect()?;
        Some(BoundingBox {
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        })
    }

    fn type_name(&self) -> &'static str {
        match &self.value {
            GeoJsonValue::Point(_) => "Point",
            GeoJsonValue::MultiPoint(_) => "MultiPoint",
            GeoJsonValue::LineString(_) => "LineString",
            GeoJsonValue::MultiLineString(_) => "MultiLineString",
            GeoJsonValue::Polygon(_) => "Polygon",
            GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
            GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
        }
    }
}

pub fn geojson_polygon(polygon: &Polygon<f64>) -> GeoJsonGeometry {
    let mut rings = vec![line_to_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_to_positions));
    GeoJsonGeometry::new(GeoJsonValue::Polygon(rings))
}

pub fn geojson_line(line: &LineString<f64>) -> GeoJsonGeometry {
    GeoJsonGeometry::new(GeoJsonValue::LineString(line_to_positions(line)))
}

/// Parse a `[lon, lat, ...]` position. Extra ordinates (altitude) are ignored.
pub fn position_to_coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn positions_to_line(positions: &[Vec<f64>]) -> Option<LineString<f64>> {
    positions
        .iter()
        .map(|p| position_to_coord(p))
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn rings_to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    let exterior = positions_to_line(exterior)?;
    if exterior.0.len() < 3 {
        return None;
    }
    let interiors = interiors
        .iter()
        .map(|ring| positions_to_line(ring))
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn line_to_positions(line: &LineString<f64>) -> Vec<Vec<f64>> {
    line.coords().map(|c| vec![c.x, c.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polygon_from_json() {
        let raw = r#"{"type":"Polygon","coordinates":[[[4.8,52.3],[4.9,52.3],[4.9,52.4],[4.8,52.3]]]}"#;
        let geometry: GeoJsonGeometry = serde_json::from_str(raw).unwrap();
        assert!(matches!(geometry.to_geo(), Some(Geometry::Polygon(_))));

        let bbox = geometry.bounding_box().unwrap();
        assert_eq!(bbox.west, 4.8);
        assert_eq!(bbox.north, 52.4);
    }

    #[test]
    fn short_positions_are_rejected() {
        let geometry = GeoJsonGeometry::new(GeoJsonValue::Polygon(vec![vec![
            vec![4.8, 52.3],
            vec![4.9],
            vec![4.9, 52.4],
        ]]));
        assert!(geometry.to_geo().is_none());
        assert!(geometry.bounding_box().is_none());
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let geometry = GeoJsonGeometry::new(GeoJsonValue::Point(vec![f64::NAN, 52.0]));
        assert!(geometry.to_geo().is_none());
    }

    #[test]
    fn unsupported_types_do_not_convert() {
        let geometry = GeoJsonGeometry::new(GeoJsonValue::MultiPoint(vec![vec![4.8, 52.3]]));
        assert!(geometry.to_geo().is_none());
        assert_eq!(geometry.type_name(), "MultiPoint");
    }

    #[test]
    fn altitude_ordinate_is_ignored() {
        let geometry = GeoJsonGeometry::new(GeoJsonValue::LineString(vec![
            vec![4.8, 52.3, 120.0],
            vec![4.9, 52.35, 80.0],
        ]));
        let Some(Geometry::LineString(line)) = geometry.to_geo() else {
            panic!("expected line string");
        };
        assert_eq!(line.0[1], Coord { x: 4.9, y: 52.35 });
    }

    #[test]
    fn polygon_serializes_with_type_tag() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            vec![],
        );
        let value = serde_json::to_value(geojson_polygon(&polygon)).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert!(value.get("bbox").is_none());
        // geo closes the ring
        assert_eq!(value["coordinates"][0].as_array().unwrap().len(), 4);
    }
}
