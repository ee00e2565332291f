//! Handlers for `/touchpoints` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/touchpoints` | `?person_id` required |
//! | `POST` | `/touchpoints` | Body: [`CreateBody`]; returns 201 + touchpoint |
//! | `GET`  | `/touchpoints/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rapport_core::{
  store::PersonStore,
  touchpoint::{InteractionType, NewTouchpoint, Touchpoint},
};
use rapport_extract::NoteExtractor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the primary person whose touchpoints to return.
  pub person_id: Uuid,
}

/// `GET /touchpoints?person_id=<id>` — newest first.
pub async fn list<S, X>(
  State(state): State<ApiState<S, X>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Touchpoint>>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let touchpoints = state
    .store
    .list_touchpoints(params.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(touchpoints))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub primary_person_id: Option<Uuid>,
  pub raw_note:          String,
  /// Defaults to `conversation`.
  pub interaction_type:  Option<InteractionType>,
  /// Defaults to now.
  pub occurred_at:       Option<DateTime<Utc>>,
}

/// `POST /touchpoints` — saving the raw note never depends on extraction;
/// this endpoint only persists the note itself.
pub async fn create<S, X>(
  State(state): State<ApiState<S, X>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  if let Some(primary) = body.primary_person_id {
    let known = state
      .store
      .get_person(primary)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    if known.is_none() {
      return Err(ApiError::BadRequest(format!(
        "primary person {primary} not found"
      )));
    }
  }

  let touchpoint = state
    .store
    .add_touchpoint(NewTouchpoint {
      primary_person_id: body.primary_person_id,
      raw_note:          body.raw_note,
      interaction_type:  body.interaction_type.unwrap_or(InteractionType::Conversation),
      occurred_at:       body.occurred_at.unwrap_or_else(Utc::now),
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(touchpoint)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /touchpoints/:id`
pub async fn get_one<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Touchpoint>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let touchpoint = state
    .store
    .get_touchpoint(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("touchpoint {id} not found")))?;
  Ok(Json(touchpoint))
}
