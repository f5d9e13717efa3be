//! SQLite-backed airspace store used by the decision endpoint.

use std::future::Future;

use anyhow::Result;
use sqlx::SqlitePool;
use utm_core::{AirspaceSnapshot, AirspaceStore, BoundingBox, StoreError, TimeWindow};

use super::{notams, weather, zones};

/// Reads zones, notices and weather through one pooled connection per fetch.
#[derive(Clone)]
pub struct SqliteAirspaceStore {
    pool: SqlitePool,
}

impl SqliteAirspaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AirspaceStore for SqliteAirspaceStore {
    fn fetch_airspace(
        &self,
        bbox: &BoundingBox,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<AirspaceSnapshot, StoreError>> + Send {
        let pool = self.pool.clone();
        let (bbox, window) = (*bbox, *window);
        async move {
            load_snapshot(&pool, &bbox, &window)
                .await
                .map_err(|err| StoreError::new(format!("{err:#}")))
        }
    }
}

async fn load_snapshot(
    pool: &SqlitePool,
    bbox: &BoundingBox,
    window: &TimeWindow,
) -> Result<AirspaceSnapshot> {
    // Returned to the pool when dropped, on every path out of here.
    let mut conn = pool.acquire().await?;
    let zones = zones::zones_in_box(&mut *conn, bbox, window).await?;
    let notices = notams::notams_in_box(&mut *conn, bbox, window).await?;
    let weather = weather::observations_in_box(&mut *conn, bbox, window).await?;
    Ok(AirspaceSnapshot {
        zones,
        notices,
        weather,
    })
}
