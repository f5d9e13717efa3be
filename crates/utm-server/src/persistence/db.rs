//! Database connection and initialization.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Initialize the SQLite database.
///
/// Creates the database file if it doesn't exist, runs migrations,
/// and returns a connection pool. `:memory:` gives a private in-memory database.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    let db_url = if db_path == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        format!("sqlite:{}?mode=rwc", db_path)
    };

    info!("Connecting to database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&db_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(Database { pool })
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../../migrations/001_init.sql");

    info!("Running database migrations...");

    for statement in migration_sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Err(e) = sqlx::query(statement).execute(pool).await {
            let err_str = e.to_string();
            if err_str.contains("already exists") {
                continue;
            }
            if statement.to_uppercase().starts_with("CREATE") {
                anyhow::bail!("Migration failed on CREATE statement: {}", e);
            }
            warn!("Migration statement failed: {}", e);
        }
    }

    info!("Database migrations complete");
    Ok(())
}

/// Storage form of a timestamp; fixed width so text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, `None` when absent or unreadable.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            warn!("Ignoring unreadable timestamp '{}': {}", raw, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_init_database() {
        let db = init_database(":memory:", 1).await.unwrap();

        let result: (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('zones', 'notams', 'weather')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();

        assert_eq!(result.0, 3);
    }

    #[test]
    fn timestamps_sort_as_text() {
        let early = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 5, 1, 10, 30, 0).unwrap();
        let (a, b) = (format_timestamp(&early), format_timestamp(&late));
        assert_eq!(a, "2026-05-01T09:00:00.000Z");
        assert!(a < b);
        assert_eq!(parse_timestamp(Some(&b)), Some(late));
        assert_eq!(parse_timestamp(None), None);
    }
}
