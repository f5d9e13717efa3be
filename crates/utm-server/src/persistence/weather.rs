//! Weather observation persistence operations.

use anyhow::Result;
use sqlx::{SqliteConnection, SqlitePool};
use utm_core::{BoundingBox, TimeWindow, WeatherObservation};

use super::db::{format_timestamp, parse_timestamp};

/// Insert an observation and return its id. The id on `obs` is ignored.
pub async fn insert_observation(pool: &SqlitePool, obs: &WeatherObservation) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO weather (lat, lon, temperature_c, wind_speed_kts, wind_direction_deg,
                             condition, observed_at, valid_to)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(obs.lat)
    .bind(obs.lon)
    .bind(obs.temperature_c)
    .bind(obs.wind_speed_kts)
    .bind(obs.wind_direction_deg)
    .bind(&obs.condition)
    .bind(format_timestamp(&obs.observed_at))
    .bind(obs.valid_to.as_ref().map(format_timestamp))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Observations located inside `bbox` and valid during `window`, by id.
pub async fn observations_in_box(
    conn: &mut SqliteConnection,
    bbox: &BoundingBox,
    window: &TimeWindow,
) -> Result<Vec<WeatherObservation>> {
    let rows = sqlx::query_as::<_, WeatherRow>(
        r#"
        SELECT id, lat, lon, temperature_c, wind_speed_kts, wind_direction_deg, condition,
               observed_at, valid_to
        FROM weather
        WHERE lon BETWEEN ?1 AND ?2 AND lat BETWEEN ?3 AND ?4
          AND observed_at <= ?5
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

    Ok(rows.into_iter().filter_map(WeatherRow::into_observation).collect())
}

#[derive(sqlx::FromRow)]
struct WeatherRow {
    id: i64,
    lat: f64,
    lon: f64,
    temperature_c: Option<f64>,
    wind_speed_kts: f64,
    wind_direction_deg: Option<f64>,
    condition: Option<String>,
    observed_at: String,
    valid_to: Option<String>,
}

impl WeatherRow {
    fn into_observation(self) -> Option<WeatherObservation> {
        Some(WeatherObservation {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            wind_speed_kts: self.wind_speed_kts,
            observed_at: parse_timestamp(Some(&self.observed_at))?,
            valid_to: parse_timestamp(self.valid_to.as_deref()),
            temperature_c: self.temperature_c,
            wind_direction_deg: self.wind_direction_deg,
            condition: self.condition,
        })
    }
}
