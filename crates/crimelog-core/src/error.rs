//! Error types for `crimelog-core`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The campus vocabulary tables disagree with each other.
  #[error("inconsistent campus vocabulary: {0}")]
  Vocabulary(String),

  #[error("mirror file {path:?}: {source}")]
  MirrorIo {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
