//! Restricted zone persistence operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use utm_core::{BoundingBox, GeoJsonExt, GeoJsonGeometry, TimeWindow, Zone};

use super::db::{format_timestamp, parse_timestamp};

/// Source tag for zones created outside the ingestion jobs.
pub const MANUAL_SOURCE: &str = "manual";

/// Zone ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewZone {
    pub name: String,
    pub source: String,
    pub geometry: GeoJsonGeometry,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub floor_m: Option<f64>,
    pub ceiling_m: Option<f64>,
}

impl NewZone {
    /// Permanent zone without altitude limits.
    pub fn new(name: impl Into<String>, source: impl Into<String>, geometry: GeoJsonGeometry) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            geometry,
            valid_from: None,
            valid_to: None,
            floor_m: None,
            ceiling_m: None,
        }
    }
}

/// Insert a zone and return its id.
pub async fn insert_zone(pool: &SqlitePool, zone: &NewZone) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    insert_with(&mut *conn, zone).await
}

/// Replace every zone of `source` with `zones` in one transaction.
pub async fn replace_source_zones(pool: &SqlitePool, source: &str, zones: &[NewZone]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let removed = sqlx::query("DELETE FROM zones WHERE source = ?1")
        .bind(source)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    for zone in zones {
        insert_with(&mut *tx, zone).await?;
    }
    tx.commit().await?;

    tracing::debug!(
        "Replaced {} zones from source '{}' with {}",
        removed,
        source,
        zones.len()
    );
    Ok(zones.len() as u64)
}

async fn insert_with(conn: &mut SqliteConnection, zone: &NewZone) -> Result<i64> {
    let bbox = zone
        .geometry
        .bounding_box()
        .with_context(|| format!("zone '{}' has malformed geometry", zone.name))?;
    let geojson = serde_json::to_string(&zone.geometry)?;

    let result = sqlx::query(
        r#"
        INSERT INTO zones (name, source, geojson, min_lon, min_lat, max_lon, max_lat,
                           valid_from, valid_to, floor_m, ceiling_m)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&zone.name)
    .bind(&zone.source)
    .bind(&geojson)
    .bind(bbox.west)
    .bind(bbox.south)
    .bind(bbox.east)
    .bind(bbox.north)
    .bind(zone.valid_from.as_ref().map(format_timestamp))
    .bind(zone.valid_to.as_ref().map(format_timestamp))
    .bind(zone.floor_m)
    .bind(zone.ceiling_m)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Zones whose box intersects `bbox` and whose validity overlaps `window`, by id.
pub async fn zones_in_box(
    conn: &mut SqliteConnection,
    bbox: &BoundingBox,
    window: &TimeWindow,
) -> Result<Vec<Zone>> {
    let rows = sqlx::query_as::<_, ZoneRow>(
        r#"
        SELECT id, name, geojson, valid_from, valid_to, floor_m, ceiling_m
        FROM zones
        WHERE max_lon >= ?1 AND min_lon <= ?2 AND max_lat >= ?3 AND min_lat <= ?4
          AND (valid_from IS NULL OR valid_from <= ?5)
          AND (valid_to IS NULL OR valid_to >= ?6)
        ORDER BY id
        "#,
    )
    .bind(bbox.west)
    .bind(bbox.east)
    .bind(bbox.south)
    .bind(bbox.north)
    .bind(format_timestamp(&window.end))
    .bind(format_timestamp(&window.start))
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().filter_map(ZoneRow::into_zone).collect())
}

/// Count zones, optionally restricted to one source.
pub async fn count_zones(pool: &SqlitePool, source: Option<&str>) -> Result<i64> {
    let (count,): (i64,) = match source {
        Some(source) => {
            sqlx::query_as("SELECT COUNT(*) FROM zones WHERE source = ?1")
                .bind(source)
                .fetch_one(pool)
                .await?
        }
        None => sqlx::query_as("SELECT COUNT(*) FROM zones").fetch_one(pool).await?,
    };
    Ok(count)
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct ZoneRow {
    id: i64,
    name: String,
    geojson: String,
    valid_from: Option<String>,
    valid_to: Option<String>,
    floor_m: Option<f64>,
    ceiling_m: Option<f64>,
}

impl ZoneRow {
    fn into_zone(self) -> Option<Zone> {
        let geometry = match serde_json::from_str::<GeoJsonGeometry>(&self.geojson) {
            Ok(geometry) => geometry,
            Err(err) => {
                tracing::warn!("Skipping zone {} with unreadable GeoJSON: {}", self.id, err);
                return None;
            }
        };
        Some(Zone {
            id: self.id,
            name: self.name,
            geometry,
            valid_from: parse_timestamp(self.valid_from.as_deref()),
            valid_to: parse_timestamp(self.valid_to.as_deref()),
            floor_m: self.floor_m,
            ceiling_m: self.ceiling_m,
        })
    }
}
