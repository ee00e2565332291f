//! Touchpoints — one logged interaction and the note that came with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the interaction happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
  Conversation,
  Call,
  Message,
  Meeting,
  Other,
}

impl InteractionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      InteractionType::Conversation => "conversation",
      InteractionType::Call => "call",
      InteractionType::Message => "message",
      InteractionType::Meeting => "meeting",
      InteractionType::Other => "other",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "conversation" => Some(InteractionType::Conversation),
      "call" => Some(InteractionType::Call),
      "message" => Some(InteractionType::Message),
      "meeting" => Some(InteractionType::Meeting),
      "other" => Some(InteractionType::Other),
      _ => None,
    }
  }
}

/// A logged interaction. The raw note is never modified after creation;
/// extraction output hangs off it as facts and mention links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Touchpoint {
  pub touchpoint_id:     Uuid,
  /// The person the interaction was primarily with, when known.
  pub primary_person_id: Option<Uuid>,
  /// Verbatim note text as entered.
  pub raw_note:          String,
  /// Engine-written digest; `None` until a commit supplies one.
  pub summary:           Option<String>,
  pub interaction_type:  InteractionType,
  pub occurred_at:       DateTime<Utc>,
  pub created_at:        DateTime<Utc>,
  /// Distinct people linked to this touchpoint by extraction commits.
  pub mentioned_people:  Vec<Uuid>,
}

/// Input to [`crate::store::PersonStore::add_touchpoint`].
#[derive(Debug, Clone)]
pub struct NewTouchpoint {
  pub primary_person_id: Option<Uuid>,
  pub raw_note:          String,
  pub interaction_type:  InteractionType,
  pub occurred_at:       DateTime<Utc>,
}

impl NewTouchpoint {
  /// A conversation note taken just now.
  pub fn new(primary_person_id: Option<Uuid>, raw_note: impl Into<String>) -> Self {
    NewTouchpoint {
      primary_person_id,
      raw_note: raw_note.into(),
      interaction_type: InteractionType::Conversation,
      occurred_at: Utc::now(),
    }
  }
}
