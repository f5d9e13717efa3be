//! Persistence layer for the UTM server.
//!
//! SQLite storage for zones, notams and weather observations, plus the
//! `AirspaceStore` implementation the decision endpoint reads through.

pub mod db;
pub mod notams;
pub mod store;
pub mod weather;
pub mod zones;

pub use db::{init_database, Database};
pub use store::SqliteAirspaceStore;
