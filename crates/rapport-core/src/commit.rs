//! Command objects for the extraction commit.
//!
//! Phase B never talks to the store piecemeal. It reduces a reviewed draft
//! to a [`CommitPlan`] — a pure description of every write — and the store
//! applies the whole plan in one transaction. People created by the plan
//! are addressed by index through [`PersonRef::Created`], since they have
//! no id until the transaction runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  fact::{Fact, FactCategory, NewFact, TimeProgression},
  person::{NewPerson, Person},
  relationship::{RelationshipOutcome, RelationshipSource},
};

/// A person that may not exist until the plan is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRef {
  /// Already in the registry.
  Existing(Uuid),
  /// Index into [`CommitPlan::new_persons`].
  Created(usize),
}

/// A fact write inside a plan; the owner resolves at apply time.
#[derive(Debug, Clone)]
pub struct PlannedFact {
  pub person:            PersonRef,
  pub category:          FactCategory,
  pub key:               String,
  pub value:             String,
  pub fact_date:         Option<NaiveDate>,
  pub is_time_sensitive: bool,
  pub time_progression:  Option<TimeProgression>,
  pub confidence:        f64,
}

impl PlannedFact {
  /// Materialize as a concrete [`NewFact`] once the owner is resolved.
  pub fn to_new_fact(&self, person_id: Uuid, touchpoint_id: Uuid) -> NewFact {
    NewFact {
      person_id,
      touchpoint_id: Some(touchpoint_id),
      category: self.category,
      key: self.key.clone(),
      value: self.value.clone(),
      fact_date: self.fact_date,
      is_time_sensitive: self.is_time_sensitive,
      time_progression: self.time_progression,
      confidence: self.confidence,
    }
  }
}

/// A relationship edge inside a plan (create-or-skip on apply).
#[derive(Debug, Clone)]
pub struct PlannedRelationship {
  pub person:  PersonRef,
  pub related: PersonRef,
  pub kind:    String,
  pub source:  RelationshipSource,
}

/// Everything phase B applies to one touchpoint, as a single atomic unit.
#[derive(Debug, Clone)]
pub struct CommitPlan {
  pub touchpoint_id: Uuid,
  /// Digest to store on the touchpoint; `None` leaves it untouched.
  pub summary:       Option<String>,
  /// App-local people to create, in order; referenced by
  /// [`PersonRef::Created`] indexes.
  pub new_persons:   Vec<NewPerson>,
  /// People to link into the touchpoint's mentioned set.
  pub mentions:      Vec<PersonRef>,
  pub relationships: Vec<PlannedRelationship>,
  pub facts:         Vec<PlannedFact>,
}

impl CommitPlan {
  /// An empty plan for the touchpoint — applying it changes nothing.
  pub fn empty(touchpoint_id: Uuid) -> Self {
    CommitPlan {
      touchpoint_id,
      summary: None,
      new_persons: Vec::new(),
      mentions: Vec::new(),
      relationships: Vec::new(),
      facts: Vec::new(),
    }
  }
}

/// A fact write as applied: the stored fact, plus the prior version it
/// superseded, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFact {
  pub fact:       Fact,
  pub superseded: Option<Uuid>,
}

/// What a commit actually applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
  pub touchpoint_id:   Uuid,
  pub created_persons: Vec<Person>,
  /// People newly linked into the touchpoint's mentioned set.
  pub linked_mentions: Vec<Uuid>,
  pub relationships:   Vec<RelationshipOutcome>,
  pub facts:           Vec<RecordedFact>,
  pub summary_updated: bool,
}
