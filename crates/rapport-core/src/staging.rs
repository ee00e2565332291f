//! Staged extraction output awaiting human review.
//!
//! A draft is what phase A hands back: the collaborator's summary, the
//! people it saw, and the candidate facts, each annotated with how the name
//! resolved against the registry. Nothing in a draft is persisted. The
//! reviewer edits it (toggling `confirmed`, fixing bindings) and submits it
//! for commit, or drops it to cancel the whole extraction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  fact::{FactCategory, TimeProgression},
  matcher::MatchKind,
};

/// One person mentioned in the note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionEntry {
  /// The name exactly as the collaborator reported it.
  pub name:                    String,
  pub relationship_to_primary: Option<String>,
  pub is_primary:              bool,
  /// Registry person this mention resolved to, when binding was confident.
  pub bound_person:            Option<Uuid>,
  /// Ranked alternatives for the reviewer when no auto-bind happened.
  #[serde(default)]
  pub candidates:              Vec<MatchCandidate>,
  pub confirmed:               bool,
}

/// A candidate binding surfaced to the reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
  pub person_id:    Uuid,
  pub display_name: String,
  pub score:        f64,
  pub kind:         MatchKind,
}

/// One candidate fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactEntry {
  /// Who the fact is about, as the collaborator wrote it.
  pub person_name:       String,
  pub category:          FactCategory,
  pub key:               String,
  pub value:             String,
  pub fact_date:         Option<NaiveDate>,
  pub is_time_sensitive: bool,
  pub time_progression:  Option<TimeProgression>,
  pub confidence:        f64,
  pub confirmed:         bool,
}

/// The full staged result of an extraction pass over one touchpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionDraft {
  pub summary:  String,
  pub mentions: Vec<MentionEntry>,
  pub facts:    Vec<FactEntry>,
}

impl ExtractionDraft {
  /// Mentions the reviewer left confirmed, excluding the primary binding.
  pub fn confirmed_mentions(&self) -> impl Iterator<Item = &MentionEntry> {
    self.mentions.iter().filter(|m| m.confirmed && !m.is_primary)
  }

  pub fn confirmed_facts(&self) -> impl Iterator<Item = &FactEntry> {
    self.facts.iter().filter(|f| f.confirmed)
  }
}
