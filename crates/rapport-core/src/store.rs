//! The `PersonStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `rapport-store-sqlite`). Higher layers (`rapport-extract`,
//! `rapport-api`) depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  commit::{CommitOutcome, CommitPlan, RecordedFact},
  fact::{Fact, FactCategory, NewFact},
  person::{NewPerson, Person},
  relationship::{NewRelationship, PersonRelationship, RelationshipOutcome},
  touchpoint::{NewTouchpoint, Touchpoint},
};

/// Abstraction over a rapport storage backend.
///
/// Fact writes are append-only: [`PersonStore::record_fact`] is the sole
/// mutation path, and replacing a value supersedes the old row rather than
/// updating it. [`PersonStore::commit_extraction`] applies a whole reviewed
/// extraction in one atomic unit.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Create and persist a person. Fails if `external_contact_id` does not
  /// agree with the source (present iff the person came from the phone
  /// contact book).
  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// List the whole registry, ordered by first then last name.
  fn list_persons(&self) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Touchpoints ───────────────────────────────────────────────────────

  /// Persist a logged interaction. The `created_at` timestamp is set by the
  /// store; the raw note is stored verbatim and never modified afterwards.
  fn add_touchpoint(
    &self,
    input: NewTouchpoint,
  ) -> impl Future<Output = Result<Touchpoint, Self::Error>> + Send + '_;

  /// Retrieve a touchpoint (with its mentioned-people links) by id.
  fn get_touchpoint(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Touchpoint>, Self::Error>> + Send + '_;

  /// Touchpoints whose primary person is `person_id`, newest first.
  fn list_touchpoints(
    &self,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Touchpoint>, Self::Error>> + Send + '_;

  // ── Facts — append-only writes ────────────────────────────────────────

  /// Record a fact, superseding any active fact for the same
  /// `(person, category, key)` — key compared case-insensitively. The
  /// `extracted_at` timestamp is set by the store.
  fn record_fact(
    &self,
    input: NewFact,
  ) -> impl Future<Output = Result<RecordedFact, Self::Error>> + Send + '_;

  /// Retrieve a single fact version by id. Returns `None` if not found.
  fn get_fact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Fact>, Self::Error>> + Send + '_;

  /// Facts about a person, newest first. With `include_superseded` false,
  /// only the active version of each `(category, key)` is returned.
  fn facts_for(
    &self,
    person_id: Uuid,
    include_superseded: bool,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + '_;

  /// Every version ever recorded for one `(person, category, key)`, newest
  /// first — the supersession chain.
  fn fact_history<'a>(
    &'a self,
    person_id: Uuid,
    category: FactCategory,
    key: &'a str,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + 'a;

  // ── Relationships ─────────────────────────────────────────────────────

  /// Create a directed edge, or skip if the directed pair already has one
  /// (whatever its kind — the stored kind wins).
  fn add_relationship(
    &self,
    input: NewRelationship,
  ) -> impl Future<Output = Result<RelationshipOutcome, Self::Error>> + Send + '_;

  /// Outgoing edges from a person.
  fn relationships_for(
    &self,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PersonRelationship>, Self::Error>> + Send + '_;

  // ── Extraction commit ─────────────────────────────────────────────────

  /// Apply a reviewed extraction plan as one atomic unit: create planned
  /// people, link mentions, add relationship edges, record facts (with
  /// supersession) and update the touchpoint summary. Either every write
  /// lands or none do.
  fn commit_extraction(
    &self,
    plan: CommitPlan,
  ) -> impl Future<Output = Result<CommitOutcome, Self::Error>> + Send + '_;
}
