//! SQLite backend for the crimelog incident store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod export;
mod rows;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use export::{EXPORT_TABLES, ExportReport};
pub use store::SqliteStore;
