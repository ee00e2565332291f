//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Whole registry, ordered by name |
//! | `POST` | `/persons` | Body: [`CreateBody`]; returns 201 + person |
//! | `GET`  | `/persons/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rapport_core::{
  person::{NewPerson, Person, PersonSource},
  store::PersonStore,
};
use rapport_extract::NoteExtractor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S, X>(
  State(state): State<ApiState<S, X>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let persons = state
    .store
    .list_persons()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(persons))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub first_name:          String,
  #[serde(default)]
  pub last_name:           String,
  /// Defaults to `app_local`.
  pub source:              Option<PersonSource>,
  pub external_contact_id: Option<String>,
}

/// `POST /persons` — body: `{"first_name":"Maya","last_name":"Chen"}`
pub async fn create<S, X>(
  State(state): State<ApiState<S, X>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let input = NewPerson {
    first_name:          body.first_name,
    last_name:           body.last_name,
    source:              body.source.unwrap_or(PersonSource::AppLocal),
    external_contact_id: body.external_contact_id,
  };
  input
    .validate()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let person = state
    .store
    .add_person(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}
