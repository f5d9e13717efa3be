//! Server configuration from environment.

use std::env;
use std::str::FromStr;

use utm_core::DecisionConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    pub decision: DecisionConfig,
    pub ingest_enabled: bool,
    pub ingest_interval_secs: u64,
    pub dfp_landingsite_url: Option<String>,
    pub dfp_landingsite_radius_m: f64,
    pub dfp_spoor_url: Option<String>,
    pub dfp_spoor_buffer_m: f64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = DecisionConfig::default();
        Self {
            server_port: parse_env("UTM_PORT", 8787),
            database_path: env::var("UTM_DATABASE_PATH")
                .unwrap_or_else(|_| "data/utm.db".to_string()),
            database_max_connections: parse_env("UTM_DATABASE_MAX_CONNECTIONS", 5),
            decision: DecisionConfig {
                corridor_width_m: parse_env("UTM_CORRIDOR_WIDTH_M", defaults.corridor_width_m),
                wind_limit_kts: parse_env("UTM_WIND_LIMIT_KTS", defaults.wind_limit_kts),
                grid_steps: parse_env("UTM_GRID_STEPS", defaults.grid_steps).max(1),
                simplify_tolerance_m: parse_env(
                    "UTM_SIMPLIFY_TOLERANCE_M",
                    defaults.simplify_tolerance_m,
                ),
            },
            ingest_enabled: env::var("UTM_INGEST_ENABLED")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            ingest_interval_secs: parse_env("UTM_INGEST_INTERVAL_SECS", 3600).max(1),
            dfp_landingsite_url: non_empty_env("DFP_LANDINGSITE_URL"),
            dfp_landingsite_radius_m: parse_env("DFP_LANDINGSITE_RADIUS", 300.0),
            dfp_spoor_url: non_empty_env("DFP_SPOOR_URL"),
            dfp_spoor_buffer_m: parse_env("DFP_SPOOR_BUFFER", 100.0),
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
