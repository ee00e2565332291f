//! JSON REST API for Rapport.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rapport_core::store::PersonStore`] plus a
//! [`rapport_extract::NoteExtractor`] driving the extraction endpoints.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rapport_api::api_router(store.clone(), extractor))
//! ```

pub mod error;
pub mod extraction;
pub mod facts;
pub mod persons;
pub mod relationships;
pub mod touchpoints;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use rapport_core::store::PersonStore;
use rapport_extract::{NoteExtractor, Orchestrator};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, X> {
  pub store:        Arc<S>,
  pub orchestrator: Arc<Orchestrator<S, X>>,
}

impl<S, X> Clone for ApiState<S, X> {
  fn clone(&self) -> Self {
    ApiState {
      store:        Arc::clone(&self.store),
      orchestrator: Arc::clone(&self.orchestrator),
    }
  }
}

/// Build a fully-materialised API router for `store` and `extractor`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, X>(store: Arc<S>, extractor: X) -> Router<()>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let state = ApiState {
    store:        Arc::clone(&store),
    orchestrator: Arc::new(Orchestrator::new(store, extractor)),
  };
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S, X>).post(persons::create::<S, X>))
    .route("/persons/{id}", get(persons::get_one::<S, X>))
    .route(
      "/persons/{id}/relationships",
      get(relationships::list_for_person::<S, X>),
    )
    // Touchpoints
    .route(
      "/touchpoints",
      get(touchpoints::list::<S, X>).post(touchpoints::create::<S, X>),
    )
    .route("/touchpoints/{id}", get(touchpoints::get_one::<S, X>))
    .route(
      "/touchpoints/{id}/extract",
      post(extraction::extract_one::<S, X>),
    )
    .route(
      "/touchpoints/{id}/commit",
      post(extraction::commit_one::<S, X>),
    )
    // Facts
    .route("/facts", get(facts::list::<S, X>).post(facts::create::<S, X>))
    .route("/facts/{id}", get(facts::get_one::<S, X>))
    .route("/facts/{id}/history", get(facts::history::<S, X>))
    // Relationships
    .route("/relationships", post(relationships::create::<S, X>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
