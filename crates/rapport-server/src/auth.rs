//! HTTP Basic-auth verification and middleware.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Middleware guarding everything nested under it.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  request: Request,
  next: Next,
) -> Response {
  match verify_auth(request.headers(), &auth) {
    Ok(()) => next.run(request).await,
    Err(err) => err.into_response(),
  }
}

/// Verify Basic credentials from request headers.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash =
    PasswordHash::new(&config.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::header;
  use rand_core::OsRng;

  fn make_config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig {
      username:      "user".to_string(),
      password_hash: hash,
    }
  }

  fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value.parse().unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials() {
    let config = make_config("secret");
    let headers = headers_with(&basic("user", "secret"));
    assert!(verify_auth(&headers, &config).is_ok());
  }

  #[test]
  fn wrong_password() {
    let config = make_config("secret");
    let headers = headers_with(&basic("user", "wrong"));
    assert!(matches!(
      verify_auth(&headers, &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn wrong_username() {
    let config = make_config("secret");
    let headers = headers_with(&basic("intruder", "secret"));
    assert!(matches!(
      verify_auth(&headers, &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    let config = make_config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let config = make_config("secret");
    let headers = headers_with("Basic !!!not-base64!!!");
    assert!(matches!(
      verify_auth(&headers, &config),
      Err(Error::Unauthorized)
    ));
  }
}
