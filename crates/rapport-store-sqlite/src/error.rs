//! Error type for `rapport-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rapport_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column value did not decode to its domain type.
  #[error("column decode error: {0}")]
  Decode(String),

  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),

  #[error("touchpoint not found: {0}")]
  TouchpointNotFound(uuid::Uuid),
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::Database(tokio_rusqlite::Error::Rusqlite(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
