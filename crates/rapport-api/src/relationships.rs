//! Handlers for relationship endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons/:id/relationships` | Outgoing edges, oldest first |
//! | `POST` | `/relationships` | Create-or-skip; 201 created, 200 skipped |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rapport_core::{
  relationship::{NewRelationship, PersonRelationship, RelationshipSource},
  store::PersonStore,
};
use rapport_extract::NoteExtractor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons/:id/relationships`
pub async fn list_for_person<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PersonRelationship>>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let edges = state
    .store
    .relationships_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(edges))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub person_id:         Uuid,
  pub related_person_id: Uuid,
  pub kind:              String,
  /// Defaults to `manual`.
  pub source:            Option<RelationshipSource>,
}

/// `POST /relationships` — the first edge between a pair wins; replaying
/// the pair answers 200 with the stored edge instead of a duplicate.
pub async fn create<S, X>(
  State(state): State<ApiState<S, X>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  if body.person_id == body.related_person_id {
    return Err(ApiError::BadRequest(
      "a relationship cannot point at its own person".into(),
    ));
  }
  if body.kind.trim().is_empty() {
    return Err(ApiError::BadRequest("relationship kind must not be empty".into()));
  }

  let outcome = state
    .store
    .add_relationship(NewRelationship {
      person_id:         body.person_id,
      related_person_id: body.related_person_id,
      kind:              body.kind,
      source:            body.source.unwrap_or(RelationshipSource::Manual),
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let status = if outcome.was_created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((status, Json(outcome)))
}
