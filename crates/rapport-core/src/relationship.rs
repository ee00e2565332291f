//! Relationship edges between people.
//!
//! Edges are directed: "Ana -> manager -> Raj" and "Raj -> report -> Ana"
//! are distinct rows. Within one direction the pair is unique regardless of
//! kind, and the first stored kind wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a relationship edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSource {
  PhoneContacts,
  Extracted,
  Manual,
}

impl RelationshipSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      RelationshipSource::PhoneContacts => "phone_contacts",
      RelationshipSource::Extracted => "extracted",
      RelationshipSource::Manual => "manual",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "phone_contacts" => Some(RelationshipSource::PhoneContacts),
      "extracted" => Some(RelationshipSource::Extracted),
      "manual" => Some(RelationshipSource::Manual),
      _ => None,
    }
  }
}

/// A directed edge from `person_id` to `related_person_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRelationship {
  pub relationship_id:   Uuid,
  pub person_id:         Uuid,
  pub related_person_id: Uuid,
  /// Free-text relation label as reported, e.g. "sister", "manager".
  pub kind:              String,
  pub source:            RelationshipSource,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::PersonStore::add_relationship`].
#[derive(Debug, Clone)]
pub struct NewRelationship {
  pub person_id:         Uuid,
  pub related_person_id: Uuid,
  pub kind:              String,
  pub source:            RelationshipSource,
}

impl NewRelationship {
  pub fn extracted(person_id: Uuid, related_person_id: Uuid, kind: impl Into<String>) -> Self {
    NewRelationship {
      person_id,
      related_person_id,
      kind: kind.into(),
      source: RelationshipSource::Extracted,
    }
  }
}

/// Result of an edge write: either a fresh row, or the pre-existing edge
/// for the same directed pair (whose kind was kept).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "relationship", rename_all = "snake_case")]
pub enum RelationshipOutcome {
  Created(PersonRelationship),
  Skipped(PersonRelationship),
}

impl RelationshipOutcome {
  pub fn edge(&self) -> &PersonRelationship {
    match self {
      RelationshipOutcome::Created(edge) | RelationshipOutcome::Skipped(edge) => edge,
    }
  }

  pub fn was_created(&self) -> bool {
    matches!(self, RelationshipOutcome::Created(_))
  }
}
