//! Error types for `rapport-core`.

use thiserror::Error;
use uuid::Uuid;

/// Domain-rule violations shared by every storage backend.
#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("touchpoint not found: {0}")]
  TouchpointNotFound(Uuid),

  #[error("fact not found: {0}")]
  FactNotFound(Uuid),

  /// A commit plan referenced `Created(index)` beyond its own new-person
  /// list.
  #[error("commit plan references created person #{0}, which it never creates")]
  InvalidPersonRef(usize),

  #[error("external_contact_id must be set exactly when source is phone_contact")]
  ExternalContactIdMismatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
