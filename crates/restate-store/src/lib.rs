//! restate-store — SQLite persistence for analysis records.
//!
//! All statements run on one dedicated worker thread that owns the
//! connection; async callers hand it closures and await the reply. Version
//! numbers are assigned inside an immediate transaction backed by a unique
//! `(content_hash, version_no)` index.

mod connection;
mod helpers;
mod migrations;
mod notes;
mod records;
mod store;

pub use connection::SqliteStore;
pub use migrations::CURRENT_SCHEMA_VERSION;
