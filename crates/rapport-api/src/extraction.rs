//! Handlers for the two-phase extraction endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/touchpoints/:id/extract` | Phase one; returns the staged draft, writes nothing |
//! | `POST` | `/touchpoints/:id/commit` | Phase two; body is the reviewed draft |
//!
//! Cancelling a review is simply never calling commit — a draft that is
//! dropped costs nothing.

use axum::{
  Json,
  extract::{Path, State},
};
use rapport_core::{commit::CommitOutcome, staging::ExtractionDraft, store::PersonStore};
use rapport_extract::NoteExtractor;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `POST /touchpoints/:id/extract`
pub async fn extract_one<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ExtractionDraft>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let draft = state.orchestrator.extract(id).await?;
  Ok(Json(draft))
}

/// `POST /touchpoints/:id/commit` — body: the (possibly edited) draft from
/// the extract endpoint. Applies atomically; a failure writes nothing.
pub async fn commit_one<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
  Json(draft): Json<ExtractionDraft>,
) -> Result<Json<CommitOutcome>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let outcome = state.orchestrator.commit(id, &draft).await?;
  Ok(Json(outcome))
}
