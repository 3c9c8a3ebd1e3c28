//! Error type for curriculum import.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid curriculum file: {0}")]
  Json(#[from] serde_json::Error),

  /// A journey names a topic key that the file does not define.
  #[error("journey {journey:?} references unknown topic {key:?}")]
  UnknownTopic { journey: String, key: String },

  #[error("duplicate topic key {0:?}")]
  DuplicateTopic(String),

  #[error("store error: {0}")]
  Store(#[from] learnspeak_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
