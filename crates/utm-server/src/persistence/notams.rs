//! NOTAM persistence operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use utm_core::{BoundingBox, GeoJsonExt, GeoJsonGeometry, Notice, TimeWindow};

use super::db::{format_timestamp, parse_timestamp};

/// Insert a notice and return its id. The id on `notice` is ignored.
pub async fn insert_notam(pool: &SqlitePool, notice: &Notice) -> Result<i64> {
    let bbox = notice
        .geometry
        .bounding_box()
        .with_context(|| format!("notice '{}' has malformed geometry", notice.title))?;
    let geojson = serde_json::to_string(&notice.geometry)?;

    let result = sqlx::query(
        r#"
        INSERT INTO notams (title, severity, geojson, min_lon, min_lat, max_lon, max_lat,
                            starts_at, ends_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&notice.title)
    .bind(&notice.severity)
    .bind(&geojson)
    .bind(bbox.west)
    .bind(bbox.south)
    .bind(bbox.east)
    .bind(bbox.north)
    .bind(format_timestamp(&notice.start))
    .bind(notice.end.as_ref().map(format_timestamp))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Notices whose box intersects `bbox` and whose validity overlaps `window`, by id.
pub async fn notams_in_box(
    conn: &mut SqliteConnection,
    bbox: &BoundingBox,
    window: &TimeWindow,
) -> Result<Vec<Notice>> {
    let rows = sqlx::query_as::<_, NotamRow>(
        r#"
        SELECT id, title, severity, geojson, starts_at, ends_at
        FROM notams
        WHERE max_lon >= ?1 AND min_lon <= ?2 AND max_lat >= ?3 AND min_lat <= ?4
          AND starts_at <= ?5
          AND (ends_at IS NULL OR ends_at >= ?6)
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

    Ok(rows.into_iter().filter_map(NotamRow::into_notice).collect())
}

#[derive(sqlx::FromRow)]
struct NotamRow {
    id: i64,
    title: String,
    severity: String,
    geojson: String,
    starts_at: String,
    ends_at: Option<String>,
}

impl NotamRow {
    fn into_notice(self) -> Option<Notice> {
        let geometry = match serde_json::from_str::<GeoJsonGeometry>(&self.geojson) {
            Ok(geometry) => geometry,
            Err(err) => {
                tracing::warn!("Skipping notam {} with unreadable GeoJSON: {}", self.id, err);
                return None;
            }
        };
        let start: DateTime<Utc> = parse_timestamp(Some(&self.starts_at))?;
        Some(Notice {
            id: self.id,
            title: self.title,
            severity: self.severity,
            geometry,
            start,
            end: parse_timestamp(self.ends_at.as_deref()),
        })
    }
}
