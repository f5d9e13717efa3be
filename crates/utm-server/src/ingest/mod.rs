//! Zone ingestion from upstream planner feeds.

pub mod dfp;
pub mod wkt;

pub use dfp::{ingest_feed, DfpFeed};
