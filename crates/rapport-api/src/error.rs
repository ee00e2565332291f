//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The extraction collaborator failed or answered nonsense.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<rapport_extract::Error> for ApiError {
  fn from(err: rapport_extract::Error) -> Self {
    use rapport_extract::Error as E;
    match err {
      E::TouchpointNotFound(id) => ApiError::NotFound(format!("touchpoint {id} not found")),
      E::PersonNotFound(id) => ApiError::NotFound(format!("person {id} not found")),
      E::NoPrimaryPerson(id) => {
        ApiError::BadRequest(format!("touchpoint {id} has no primary person"))
      }
      E::Transport(e) => ApiError::Upstream(e.to_string()),
      E::Api { status, .. } => ApiError::Upstream(format!("collaborator returned {status}")),
      E::MalformedResponse(m) => {
        ApiError::Upstream(format!("malformed collaborator response: {m}"))
      }
      E::Store(e) | E::Commit(e) => ApiError::Store(e),
    }
  }
}
