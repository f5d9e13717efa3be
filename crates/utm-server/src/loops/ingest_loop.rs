//! Periodic zone ingestion from the planner feeds.
//!
//! Each feed runs in its own loop: a short start-up delay, then one refresh per
//! interval. Failed refreshes retry with backoff, capped at the interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::backoff::Backoff;
use crate::ingest::{ingest_feed, DfpFeed};
use crate::state::AppState;

const LANDING_SITES_INITIAL_DELAY: Duration = Duration::from_secs(4);
const RAIL_INITIAL_DELAY: Duration = Duration::from_secs(6);
const RETRY_BASE: Duration = Duration::from_secs(30);
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

impl DfpFeed {
    fn initial_delay(self) -> Duration {
        match self {
            DfpFeed::LandingSites => LANDING_SITES_INITIAL_DELAY,
            DfpFeed::Rail => RAIL_INITIAL_DELAY,
        }
    }
}

/// Spawn one ingestion loop per feed.
pub fn spawn_ingest_loops(state: Arc<AppState>, shutdown: &broadcast::Sender<()>) {
    for feed in [DfpFeed::LandingSites, DfpFeed::Rail] {
        tokio::spawn(run_ingest_loop(state.clone(), feed, shutdown.subscribe()));
    }
}

/// Refresh one feed until shutdown.
pub async fn run_ingest_loop(
    state: Arc<AppState>,
    feed: DfpFeed,
    mut shutdown: broadcast::Receiver<()>,
) {
    let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("[ingest] {} client setup failed: {}", feed, err);
            return;
        }
    };
    let interval = Duration::from_secs(state.config().ingest_interval_secs);
    let mut backoff = Backoff::new(RETRY_BASE.min(interval), interval);
    let mut next_run = feed.initial_delay();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(next_run) => {}
            _ = shutdown.recv() => {
                tracing::info!("[ingest] {} loop stopping", feed);
                return;
            }
        }

        next_run = match ingest_feed(state.db(), &client, state.config(), feed).await {
            Ok(_) => {
                backoff.reset();
                interval
            }
            Err(err) => {
                let delay = backoff.fail();
                tracing::error!(
                    "[ingest] {} refresh failed: {:#}; retrying in {:?}",
                    feed,
                    err,
                    delay
                );
                delay
            }
        };
    }
}
