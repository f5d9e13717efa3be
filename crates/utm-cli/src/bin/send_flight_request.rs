//! CLI tool to submit a flight request to the UTM backend and print the decision.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use utm_cli::{build_flight_request, submit_flight_request};
use utm_core::{DecisionKind, GeoJsonValue};

/// Submit a flight request and print the decision
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// UTM Server URL
    #[arg(long, default_value = "http://localhost:8787")]
    url: String,

    /// Start position as lon,lat
    #[arg(long)]
    from: String,

    /// End position as lon,lat
    #[arg(long)]
    to: String,

    /// Intermediate waypoint as lon,lat (repeatable)
    #[arg(long)]
    via: Vec<String>,

    /// Window start (RFC 3339); defaults to now
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Window length in minutes
    #[arg(long, default_value_t = 60)]
    duration_min: i64,

    /// Drone identifier
    #[arg(long)]
    drone_id: Option<String>,

    /// Operator identifier
    #[arg(long)]
    operator_id: Option<String>,

    /// Print the raw JSON decision
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let request = build_flight_request(
        &args.from,
        &args.via,
        &args.to,
        args.start.unwrap_or_else(Utc::now),
        args.duration_min,
        args.drone_id,
        args.operator_id,
    )?;

    let client = reqwest::Client::new();
    let decision = submit_flight_request(&client, &args.url, &request)
        .await
        .context("flight request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    let verdict = match decision.decision {
        DecisionKind::Approved => "APPROVED",
        DecisionKind::Rejected => "REJECTED",
        DecisionKind::Alternative => "ALTERNATIVE",
    };
    println!("Decision: {}", verdict);
    for reason in &decision.reasons {
        println!("  - {}: {}", reason.code, reason.detail);
    }
    let alternative = decision.alternative_route.as_ref().map(|route| &route.value);
    if let Some(GeoJsonValue::LineString(coordinates)) = alternative {
        println!("Alternative route ({} points):", coordinates.len());
        for position in coordinates {
            if let [lon, lat, ..] = position.as_slice() {
                println!("  {:.6}, {:.6}", lon, lat);
            }
        }
    }

    Ok(())
}
