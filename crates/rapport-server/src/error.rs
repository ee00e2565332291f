//! Server-layer error type and axum `IntoResponse` implementation.
//!
//! Handler-level errors live in `rapport_api::ApiError`; the only error
//! this layer produces itself is an auth rejection.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    // Every rejection is a 401 challenge.
    let mut res = (StatusCode::UNAUTHORIZED, self.to_string()).into_response();
    res.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"rapport\""),
    );
    res
  }
}
