//! Purpose: Define the public Rust API boundary for jsondb.
//! Exports: Database handle, query session, document model, predicates, errors.
//! Role: Public, additive-only surface used by the CLI and embedding applications.
//! Invariants: Callers reach storage only through `JsonDb` and `Query`.

mod database;
mod page;
mod query;

pub use crate::config::Config;
pub use crate::core::document::{Document, Record};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::predicate::{Operator, Predicate, SUPPORTED_OPERATORS, loose_cmp, loose_eq};
pub use database::JsonDb;
pub use page::{Page, PageSchema};
pub use query::{DEFAULT_PRIMARY_KEY, Query};
