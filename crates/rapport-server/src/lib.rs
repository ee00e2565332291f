//! HTTP server assembly for Rapport.
//!
//! Wires the JSON API router from `rapport-api` behind HTTP Basic auth,
//! adds request tracing and an unauthenticated `/health` probe. Opening
//! the store and choosing the extractor happen in `main.rs`; everything
//! here is testable with an in-memory store and a scripted extractor.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use rapport_core::store::PersonStore;
use rapport_extract::NoteExtractor;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` merged
/// with `RAPPORT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  /// PHC string produced by argon2; see `--hash-password`.
  pub auth_password_hash: String,
  /// OpenAI-compatible chat-completions endpoint for the note extractor.
  #[serde(default = "default_llm_endpoint")]
  pub llm_api_endpoint:   String,
  pub llm_api_key:        String,
  #[serde(default = "default_llm_model")]
  pub llm_model:          String,
}

fn default_llm_endpoint() -> String {
  "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
  "gpt-4o-mini".to_string()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Assemble the full application router.
///
/// Everything under `/api` requires Basic auth; `/health` stays open so
/// probes work without credentials.
pub fn app<S, X>(store: Arc<S>, extractor: X, auth: Arc<AuthConfig>) -> Router
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  Router::new()
    .nest("/api", rapport_api::api_router(store, extractor))
    .layer(middleware::from_fn_with_state(auth, auth::require_auth))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
  "ok"
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use async_trait::async_trait;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use rapport_extract::wire::{ExtractionRequest, WireExtraction};
  use rapport_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  struct Silent;

  #[async_trait]
  impl NoteExtractor for Silent {
    async fn extract(
      &self,
      _request: &ExtractionRequest,
    ) -> rapport_extract::Result<WireExtraction> {
      Ok(WireExtraction::default())
    }
  }

  async fn make_app(password: &str) -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    app(
      store,
      Silent,
      Arc::new(AuthConfig {
        username:      "user".to_string(),
        password_hash: hash,
      }),
    )
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[tokio::test]
  async fn health_needs_no_credentials() {
    let app = make_app("secret").await;
    let response = app
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_without_credentials_returns_401() {
    let app = make_app("secret").await;
    let response = app
      .oneshot(
        Request::builder()
          .uri("/api/persons")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn api_with_credentials_passes_through() {
    let app = make_app("secret").await;
    let response = app
      .oneshot(
        Request::builder()
          .uri("/api/persons")
          .header(header::AUTHORIZATION, basic("user", "secret"))
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let persons: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(persons, serde_json::json!([]));
  }

  #[tokio::test]
  async fn api_with_wrong_password_returns_401() {
    let app = make_app("secret").await;
    let response = app
      .oneshot(
        Request::builder()
          .uri("/api/persons")
          .header(header::AUTHORIZATION, basic("user", "wrong"))
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  }
}
