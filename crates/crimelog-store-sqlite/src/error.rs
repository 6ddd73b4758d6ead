//! Error type for `crimelog-store-sqlite`.
//!
//! Every variant is a store fault: it aborts the current batch. Per-record
//! outcomes (duplicates, unresolvable campuses) are reported as counts, never
//! as errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A correction targets a campus code with no row in `campuses`.
  #[error("campus code {0:?} is not seeded")]
  UnknownCampus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
