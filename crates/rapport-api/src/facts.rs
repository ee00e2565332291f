//! Handlers for `/facts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/facts` | `?person_id` required; optional `include_superseded`, `as_of` |
//! | `POST` | `/facts` | Body: [`NewFactBody`]; returns 201 + recorded fact |
//! | `GET`  | `/facts/:id` | Single fact with its re-derived value |
//! | `GET`  | `/facts/:id/history` | Full version chain, newest first |
//!
//! Reads return [`FactView`]s: the stored baseline plus `current_value`,
//! the value advanced to the as-of date for time-sensitive facts. The
//! ledger itself is never rewritten by a read.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use rapport_core::{
  fact::{Fact, FactCategory, NewFact, TimeProgression},
  store::PersonStore,
  temporal,
};
use rapport_extract::NoteExtractor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// A stored fact plus its display value as of a given date.
#[derive(Debug, Serialize)]
pub struct FactView {
  #[serde(flatten)]
  pub fact:          Fact,
  pub current_value: String,
}

impl FactView {
  fn at(fact: Fact, as_of: NaiveDate) -> Self {
    let current_value = temporal::current_value(&fact, as_of);
    FactView { fact, current_value }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the person whose facts to return.
  pub person_id:          Uuid,
  /// If `true`, also return superseded versions. Default `false`.
  #[serde(default)]
  pub include_superseded: bool,
  /// Date to re-derive time-sensitive values at. Defaults to today.
  pub as_of:              Option<NaiveDate>,
}

/// `GET /facts?person_id=<id>[&include_superseded=true][&as_of=2025-06-01]`
pub async fn list<S, X>(
  State(state): State<ApiState<S, X>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<FactView>>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let facts = state
    .store
    .facts_for(params.person_id, params.include_superseded)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
  let views = facts.into_iter().map(|f| FactView::at(f, as_of)).collect();
  Ok(Json(views))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /facts`.
#[derive(Debug, Deserialize)]
pub struct NewFactBody {
  pub person_id:         Uuid,
  pub touchpoint_id:     Option<Uuid>,
  pub category:          FactCategory,
  pub key:               String,
  pub value:             String,
  pub fact_date:         Option<NaiveDate>,
  #[serde(default)]
  pub is_time_sensitive: bool,
  pub time_progression:  Option<TimeProgression>,
  /// Defaults to 1.0 for manually recorded facts.
  pub confidence:        Option<f64>,
}

impl From<NewFactBody> for NewFact {
  fn from(b: NewFactBody) -> Self {
    NewFact {
      person_id:         b.person_id,
      touchpoint_id:     b.touchpoint_id,
      category:          b.category,
      key:               b.key,
      value:             b.value,
      fact_date:         b.fact_date,
      is_time_sensitive: b.is_time_sensitive,
      time_progression:  b.time_progression,
      confidence:        b.confidence.unwrap_or(1.0),
    }
  }
}

/// `POST /facts` — records a new version; any active fact with the same
/// person, category, and key (case-insensitive) is superseded, never
/// deleted. Returns 201 with the stored fact and the superseded id, if any.
pub async fn create<S, X>(
  State(state): State<ApiState<S, X>>,
  Json(body): Json<NewFactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let recorded = state
    .store
    .record_fact(NewFact::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(recorded)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct AsOfParams {
  pub as_of: Option<NaiveDate>,
}

/// `GET /facts/:id[?as_of=2025-06-01]`
pub async fn get_one<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<FactView>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let fact = state
    .store
    .get_fact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("fact {id} not found")))?;
  let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
  Ok(Json(FactView::at(fact, as_of)))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /facts/:id/history` — every version sharing the fact's person,
/// category, and key, newest first. Works from any version in the chain.
pub async fn history<S, X>(
  State(state): State<ApiState<S, X>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Fact>>, ApiError>
where
  S: PersonStore + 'static,
  X: NoteExtractor + 'static,
{
  let fact = state
    .store
    .get_fact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("fact {id} not found")))?;

  let chain = state
    .store
    .fact_history(fact.person_id, fact.category, &fact.key)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(chain))
}
