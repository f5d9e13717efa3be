//! Shared application state handed to handlers and background loops.

use crate::config::Config;
use crate::persistence::{Database, SqliteAirspaceStore};

pub struct AppState {
    db: Database,
    store: SqliteAirspaceStore,
    config: Config,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let store = SqliteAirspaceStore::new(db.pool().clone());
        Self { db, store, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn store(&self) -> &SqliteAirspaceStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
