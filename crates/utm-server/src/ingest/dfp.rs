//! Drone Flight Planner feeds: landing sites and railway ("spoor") lines.
//!
//! Each feed is a JSON array of rows carrying a WKT `Coordinates` field. Rows are
//! buffered into restricted zone polygons and replace the previous import of the feed.

use anyhow::{Context, Result};
use geo::Coord;
use serde::Deserialize;
use utm_core::spatial::{buffer_point, build_corridor};
use utm_core::geometry::position_to_coord;
use utm_core::{geojson_polygon, GeoJsonExt, GeoJsonGeometry, GeoJsonValue};

use super::wkt::parse_wkt;
use crate::config::Config;
use crate::persistence::zones::{self, NewZone};
use crate::persistence::Database;

/// One upstream row. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DfpRow {
    #[serde(rename = "Coordinates", alias = "coordinates", default)]
    pub coordinates: Option<String>,
    #[serde(rename = "Sourcetext", default)]
    pub sourcetext: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

impl DfpRow {
    fn zone_name(&self, fallback: &str) -> String {
        [&self.sourcetext, &self.name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    fn geometry(&self) -> Option<GeoJsonGeometry> {
        parse_wkt(self.coordinates.as_deref()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfpFeed {
    LandingSites,
    Rail,
}

impl DfpFeed {
    /// Source tag stored on the zones of this feed.
    pub fn source(self) -> &'static str {
        match self {
            DfpFeed::LandingSites => "dfp-landingsites",
            DfpFeed::Rail => "dfp-spoor",
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            DfpFeed::LandingSites => "Landing site",
            DfpFeed::Rail => "Railway",
        }
    }

    pub fn url(self, config: &Config) -> Option<&str> {
        match self {
            DfpFeed::LandingSites => config.dfp_landingsite_url.as_deref(),
            DfpFeed::Rail => config.dfp_spoor_url.as_deref(),
        }
    }

    /// Buffer distance in meters.
    pub fn buffer_m(self, config: &Config) -> f64 {
        match self {
            DfpFeed::LandingSites => config.dfp_landingsite_radius_m,
            DfpFeed::Rail => config.dfp_spoor_buffer_m,
        }
    }

    /// Turn feed rows into zones, skipping rows that do not yield a polygon.
    pub fn zones_from_rows(self, rows: &[DfpRow], buffer_m: f64) -> Vec<NewZone> {
        rows.iter()
            .filter_map(|row| {
                let geometry = row.geometry()?;
                let polygon = match self {
                    DfpFeed::LandingSites => landing_site_polygon(&geometry, buffer_m),
                    DfpFeed::Rail => rail_polygon(&geometry, buffer_m),
                }?;
                Some(NewZone::new(
                    row.zone_name(self.default_name()),
                    self.source(),
                    polygon,
                ))
            })
            .collect()
    }
}

impl std::fmt::Display for DfpFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source())
    }
}

/// Landing sites are points buffered into discs.
fn landing_site_polygon(geometry: &GeoJsonGeometry, radius_m: f64) -> Option<GeoJsonGeometry> {
    match &geometry.value {
        GeoJsonValue::Point(position) => {
            let center = position_to_coord(position)?;
            Some(geojson_polygon(&buffer_point(center, radius_m)))
        }
        _ => None,
    }
}

/// Rail lines become corridors, points discs, polygons are kept.
fn rail_polygon(geometry: &GeoJsonGeometry, buffer_m: f64) -> Option<GeoJsonGeometry> {
    match &geometry.value {
        GeoJsonValue::LineString(positions) => {
            let coords = positions
                .iter()
                .map(|p| position_to_coord(p))
                .collect::<Option<Vec<Coord<f64>>>>()?;
            match build_corridor(&coords, buffer_m) {
                Ok(polygon) => Some(geojson_polygon(&polygon)),
                Err(err) => {
                    tracing::debug!("Skipping rail line: {}", err);
                    None
                }
            }
        }
        GeoJsonValue::Point(position) => {
            let center = position_to_coord(position)?;
            Some(geojson_polygon(&buffer_point(center, buffer_m)))
        }
        GeoJsonValue::Polygon(_) => geometry.to_geo().map(|_| geometry.clone()),
        _ => None,
    }
}

/// Fetch a feed as rows. A body that is not a JSON array is an error.
pub async fn fetch_rows(client: &reqwest::Client, url: &str) -> Result<Vec<DfpRow>> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?
        .error_for_status()?;
    let text = response.text().await?;
    serde_json::from_str(&text).with_context(|| format!("feed {} is not a JSON array of rows", url))
}

/// Fetch one feed and replace its zones. Returns the number of zones stored, or
/// `None` when the feed has no URL configured.
pub async fn ingest_feed(
    db: &Database,
    client: &reqwest::Client,
    config: &Config,
    feed: DfpFeed,
) -> Result<Option<u64>> {
    let Some(url) = feed.url(config) else {
        tracing::warn!("[ingest] {} URL not set, skipping", feed);
        return Ok(None);
    };

    let rows = fetch_rows(client, url).await?;
    let stored = store_rows(db, feed, &rows, feed.buffer_m(config)).await?;
    Ok(Some(stored))
}

/// Replace the feed's zones with the ones built from `rows`. A feed that yields no usable
/// zone leaves the previous import in place.
pub async fn store_rows(
    db: &Database,
    feed: DfpFeed,
    rows: &[DfpRow],
    buffer_m: f64,
) -> Result<u64> {
    let zones = feed.zones_from_rows(rows, buffer_m);
    if zones.is_empty() {
        let kept = zones::count_zones(db.pool(), Some(feed.source())).await?;
        tracing::warn!(
            "[ingest] {} returned no usable rows ({} rows); keeping {} stored zones",
            feed,
            rows.len(),
            kept
        );
        return Ok(0);
    }

    let stored = zones::replace_source_zones(db.pool(), feed.source(), &zones).await?;
    tracing::info!(
        "[ingest] {} zones inserted: {} ({} rows)",
        feed,
        stored,
        rows.len()
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;
    use geo::{Intersects, Point};

    fn row(coordinates: &str, sourcetext: Option<&str>, name: Option<&str>) -> DfpRow {
        DfpRow {
            coordinates: Some(coordinates.to_string()),
            sourcetext: sourcetext.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn rows_deserialize_from_feed_json() {
        let rows: Vec<DfpRow> = serde_json::from_str(
            r#"[{"ID": 7, "Coordinates": "POINT(52.3 4.8)", "Sourcetext": "Heliport"},
                {"coordinates": "POINT(52.31 4.81)", "Name": "Field"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sourcetext.as_deref(), Some("Heliport"));
        assert_eq!(rows[1].coordinates.as_deref(), Some("POINT(52.31 4.81)"));
    }

    #[test]
    fn landing_sites_become_discs() {
        let rows = vec![
            row("POINT(52.3 4.8)", Some("Heliport"), Some("ignored")),
            row("POINT(52.31 4.81)", None, None),
            row("LINESTRING(52.3 4.8, 52.31 4.81)", None, None),
            row("nonsense", None, None),
        ];
        let zones = DfpFeed::LandingSites.zones_from_rows(&rows, 300.0);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Heliport");
        assert_eq!(zones[1].name, "Landing site");
        assert_eq!(zones[0].source, "dfp-landingsites");

        let disc = zones[0].geometry.to_geo().unwrap();
        assert!(disc.intersects(&Point::new(4.8, 52.3)));
        assert!(!disc.intersects(&Point::new(4.81, 52.31)));
    }

    #[test]
    fn rail_rows_keep_or_buffer_geometry() {
        let rows = vec![
            row("LINESTRING(52.30 4.80, 52.30 4.85)", None, Some("Spoorlijn A")),
            row("POINT(52.32 4.82)", None, None),
            row("POLYGON((52.0 4.0, 52.0 4.1, 52.1 4.1, 52.0 4.0))", None, None),
            row("POLYGON((52.0 4.0, 52.0 4.1))", None, None),
        ];
        let zones = DfpFeed::Rail.zones_from_rows(&rows, 100.0);
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[0].name, "Spoorlijn A");
        assert_eq!(zones[1].name, "Railway");

        let corridor = zones[0].geometry.to_geo().unwrap();
        assert!(corridor.intersects(&Point::new(4.825, 52.30)));
        assert!(!corridor.intersects(&Point::new(4.825, 52.302)));
        assert_eq!(
            zones[2].geometry,
            GeoJsonGeometry::new(GeoJsonValue::Polygon(vec![vec![
                vec![4.0, 52.0],
                vec![4.1, 52.0],
                vec![4.1, 52.1],
                vec![4.0, 52.0]
            ]]))
        );
    }

    #[tokio::test]
    async fn unusable_feed_keeps_previous_import() {
        let db = init_database(":memory:", 1).await.unwrap();
        let feed = DfpFeed::LandingSites;

        let first = vec![row("POINT(52.3 4.8)", Some("Heliport"), None)];
        assert_eq!(store_rows(&db, feed, &first, 300.0).await.unwrap(), 1);

        let unusable = vec![row("nonsense", None, None), row("POINT(52.3)", None, None)];
        assert_eq!(store_rows(&db, feed, &unusable, 300.0).await.unwrap(), 0);
        assert_eq!(store_rows(&db, feed, &[], 300.0).await.unwrap(), 0);
        assert_eq!(
            zones::count_zones(db.pool(), Some(feed.source())).await.unwrap(),
            1
        );

        let second = vec![
            row("POINT(52.31 4.81)", None, None),
            row("POINT(52.32 4.82)", None, None),
        ];
        assert_eq!(store_rows(&db, feed, &second, 300.0).await.unwrap(), 2);
        assert_eq!(
            zones::count_zones(db.pool(), Some(feed.source())).await.unwrap(),
            2
        );
    }
}
