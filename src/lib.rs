//! Purpose: Embedded record store keeping named tables in a single JSON file.
//! Exports: `api` (database handle, query sessions, errors), `config`, `core`.
//! Role: Library backing the `jsondb` CLI and embedding applications.
//! Invariants: The JSON document on disk is the only source of truth.
//! Invariants: Every mutation rewrites the whole document under an advisory lock.
pub mod api;
pub mod config;
pub mod core;
pub(crate) mod json;
