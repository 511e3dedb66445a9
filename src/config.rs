//! Purpose: Construction-time configuration for a database handle.
//! Exports: `Config`.
//! Role: The only recognized options are the storage directory and file name.
//! Invariants: Unknown keys are rejected when loading from JSON.
//! Invariants: `db_name` must be non-empty after trimming separators.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::paths::resolve_db_path;
use crate::json::parse;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub db_path: String,
    pub db_name: String,
}

impl Config {
    pub fn new(db_path: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            db_name: db_name.into(),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let config: Config = parse::from_str(input).map_err(|err| {
            let hint = parse::hint_for_error(
                &err,
                "config",
                "an object with string fields `db_path` and `db_name`",
            );
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid config: {err}"))
                .with_hint(hint)
                .with_source(err)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read config")
                .with_path(path)
                .with_source(err)
        })?;
        Self::from_json_str(&text).map_err(|err| err.with_path(path))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.db_name.trim_matches('/').trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("db_name must not be empty")
                .with_hint("Set db_name to a file name such as `database.json`."));
        }
        Ok(())
    }

    pub fn storage_path(&self) -> PathBuf {
        resolve_db_path(&self.db_path, &self.db_name)
    }
}
