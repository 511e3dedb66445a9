// Core modules implementing document storage, table access, filtering, and errors.
pub mod document;
pub mod error;
pub mod paths;
pub mod predicate;
pub mod store;
pub mod table;
