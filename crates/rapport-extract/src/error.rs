use thiserror::Error;
use uuid::Uuid;

/// Errors from the extraction pipeline.
///
/// Extraction is additive: the touchpoint's raw note is already saved before
/// phase one starts, so every variant here leaves the note intact. Transport
/// and parse failures are recoverable (retry extraction later); a failed
/// commit rolls back and leaves no partial writes.
#[derive(Debug, Error)]
pub enum Error {
  /// The touchpoint has no primary person, which extraction requires before
  /// any network call is made.
  #[error("touchpoint {0} has no primary person")]
  NoPrimaryPerson(Uuid),

  #[error("touchpoint not found: {0}")]
  TouchpointNotFound(Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  /// Failed to reach the extraction collaborator.
  #[error("extraction transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The collaborator answered with a non-success HTTP status.
  #[error("collaborator returned {status}: {body}")]
  Api {
    status: reqwest::StatusCode,
    body:   String,
  },

  /// The collaborator's reply did not decode into the expected shape.
  #[error("malformed collaborator response: {0}")]
  MalformedResponse(String),

  /// A store read failed during phase one.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Applying the commit plan failed; the transaction rolled back.
  #[error("commit failed: {0}")]
  Commit(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
