//! Wire shapes exchanged with the extraction collaborator.
//!
//! Requests go out with camelCase keys; replies come back with snake_case
//! keys, possibly wrapped in markdown code fences. Decoding is deliberately
//! lenient: an unknown category lands in `general`, an unparseable date or
//! progression becomes `None`, and entries missing a name or key decode to
//! empty strings for staging to drop. One bad entry must never sink the
//! whole batch.

use chrono::NaiveDate;
use rapport_core::{
  fact::{FactCategory, TimeProgression},
  staging::FactEntry,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the collaborator is asked to label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
  pub note_text:           String,
  pub primary_person_name: String,
  /// Anchor for any relative dates in the note ("last Tuesday").
  pub today_date:          NaiveDate,
}

/// Top-level reply shape. Every field defaults so a sparse reply still
/// decodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireExtraction {
  #[serde(default)]
  pub summary:          String,
  #[serde(default)]
  pub mentioned_people: Vec<WireMention>,
  #[serde(default)]
  pub facts:            Vec<WireFact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMention {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub relationship_to_primary: Option<String>,
  #[serde(default)]
  pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFact {
  #[serde(default)]
  pub person_name: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub key: String,
  #[serde(default)]
  pub value: String,
  #[serde(default)]
  pub fact_date: Option<String>,
  #[serde(default)]
  pub is_time_sensitive: bool,
  #[serde(default)]
  pub time_progression: Option<String>,
  #[serde(default = "default_confidence")]
  pub confidence: f64,
}

fn default_confidence() -> f64 {
  1.0
}

impl WireFact {
  /// Lenient conversion into a staged fact entry.
  pub fn into_entry(self) -> FactEntry {
    let fact_date = self.fact_date.as_deref().and_then(parse_wire_date);
    let time_progression = self
      .time_progression
      .as_deref()
      .map(|raw| raw.trim().to_lowercase())
      .and_then(|raw| TimeProgression::parse(&raw));
    FactEntry {
      person_name: self.person_name,
      category: FactCategory::parse_or_general(&self.category),
      key: self.key,
      value: self.value,
      fact_date,
      is_time_sensitive: self.is_time_sensitive,
      time_progression,
      confidence: self.confidence.clamp(0.0, 1.0),
      confirmed: true,
    }
  }
}

fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Strip the markdown code fences some models wrap around JSON replies.
pub fn strip_code_fences(content: &str) -> &str {
  content
    .trim()
    .trim_start_matches("```json")
    .trim_start_matches("```")
    .trim_end_matches("```")
    .trim()
}

/// Decode a raw completion body into a [`WireExtraction`].
pub fn decode_extraction(content: &str) -> Result<WireExtraction> {
  serde_json::from_str(strip_code_fences(content))
    .map_err(|err| Error::MalformedResponse(err.to_string()))
}
