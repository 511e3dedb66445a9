//! Purpose: Database handle bound to one configured storage path.
//! Exports: `JsonDb`.
//! Role: Owns config and the document store; opens per-table query sessions.
//! Invariants: One handle maps to exactly one document file.
//! Invariants: Whole-document reads and clears run under the store lock.

use std::path::Path;

use tracing::debug;

use crate::api::query::Query;
use crate::config::Config;
use crate::core::document::Document;
use crate::core::error::Error;
use crate::core::store::DocumentStore;

#[derive(Clone, Debug)]
pub struct JsonDb {
    config: Config,
    store: DocumentStore,
}

impl JsonDb {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let store = DocumentStore::new(config.storage_path());
        debug!(path = %store.path().display(), "opened database");
        Ok(Self { config, store })
    }

    pub fn open(db_path: impl Into<String>, db_name: impl Into<String>) -> Result<Self, Error> {
        Self::new(Config::new(db_path, db_name))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Starts a fresh session on `name`. Nothing touches disk until an
    /// operation runs.
    pub fn table(&self, name: impl Into<String>) -> Query<'_> {
        Query::new(&self.store, name.into())
    }

    /// Full snapshot of every table. A missing file reads as no tables.
    pub fn all(&self) -> Result<Document, Error> {
        let _lock = self.store.lock()?;
        if !self.store.exists() {
            return Ok(Document::new());
        }
        self.store.read_all()
    }

    /// Truncates the document; every table is lost.
    pub fn clean(&self) -> Result<(), Error> {
        let _lock = self.store.lock()?;
        self.store.clear()
    }
}
