//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, bare dates as `YYYY-MM-DD`,
//! UUIDs as hyphenated lowercase strings, and enums by their snake_case
//! discriminants from `rapport-core`.

use chrono::{DateTime, NaiveDate, Utc};
use rapport_core::{
  fact::{Fact, FactCategory, TimeProgression},
  person::{Person, PersonSource},
  relationship::{PersonRelationship, RelationshipSource},
  touchpoint::{InteractionType, Touchpoint},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("bad date {s:?}: {e}")))
}

// ─── Enum discriminants ──────────────────────────────────────────────────────

pub fn decode_person_source(s: &str) -> Result<PersonSource> {
  PersonSource::parse(s).ok_or_else(|| Error::Decode(format!("unknown person source: {s:?}")))
}

pub fn decode_interaction_type(s: &str) -> Result<InteractionType> {
  InteractionType::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown interaction type: {s:?}")))
}

pub fn decode_category(s: &str) -> Result<FactCategory> {
  FactCategory::parse(s).ok_or_else(|| Error::Decode(format!("unknown fact category: {s:?}")))
}

pub fn decode_progression(s: &str) -> Result<TimeProgression> {
  TimeProgression::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown time progression: {s:?}")))
}

pub fn decode_relationship_source(s: &str) -> Result<RelationshipSource> {
  RelationshipSource::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown relationship source: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:           String,
  pub first_name:          String,
  pub last_name:           String,
  pub source:              String,
  pub external_contact_id: Option<String>,
  pub created_at:          String,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:           decode_uuid(&self.person_id)?,
      first_name:          self.first_name,
      last_name:           self.last_name,
      source:              decode_person_source(&self.source)?,
      external_contact_id: self.external_contact_id,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `touchpoints` row. Mention links are
/// read separately and passed into [`RawTouchpoint::into_touchpoint`].
pub struct RawTouchpoint {
  pub touchpoint_id:     String,
  pub primary_person_id: Option<String>,
  pub raw_note:          String,
  pub summary:           Option<String>,
  pub interaction_type:  String,
  pub occurred_at:       String,
  pub created_at:        String,
}

impl RawTouchpoint {
  pub fn into_touchpoint(self, mentioned: Vec<String>) -> Result<Touchpoint> {
    Ok(Touchpoint {
      touchpoint_id:     decode_uuid(&self.touchpoint_id)?,
      primary_person_id: self
        .primary_person_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      raw_note:          self.raw_note,
      summary:           self.summary,
      interaction_type:  decode_interaction_type(&self.interaction_type)?,
      occurred_at:       decode_dt(&self.occurred_at)?,
      created_at:        decode_dt(&self.created_at)?,
      mentioned_people:  mentioned
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw strings read directly from a `facts` row.
pub struct RawFact {
  pub fact_id:           String,
  pub person_id:         String,
  pub touchpoint_id:     Option<String>,
  pub category:          String,
  pub key:               String,
  pub value:             String,
  pub fact_date:         Option<String>,
  pub is_time_sensitive: bool,
  pub time_progression:  Option<String>,
  pub is_superseded:     bool,
  pub superseded_by:     Option<String>,
  pub extracted_at:      String,
  pub confidence:        f64,
}

impl RawFact {
  pub fn into_fact(self) -> Result<Fact> {
    Ok(Fact {
      fact_id:           decode_uuid(&self.fact_id)?,
      person_id:         decode_uuid(&self.person_id)?,
      touchpoint_id:     self.touchpoint_id.as_deref().map(decode_uuid).transpose()?,
      category:          decode_category(&self.category)?,
      key:               self.key,
      value:             self.value,
      fact_date:         self.fact_date.as_deref().map(decode_date).transpose()?,
      is_time_sensitive: self.is_time_sensitive,
      time_progression:  self
        .time_progression
        .as_deref()
        .map(decode_progression)
        .transpose()?,
      is_superseded:     self.is_superseded,
      superseded_by:     self.superseded_by.as_deref().map(decode_uuid).transpose()?,
      extracted_at:      decode_dt(&self.extracted_at)?,
      confidence:        self.confidence,
    })
  }
}

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub relationship_id:   String,
  pub person_id:         String,
  pub related_person_id: String,
  pub kind:              String,
  pub source:            String,
  pub created_at:        String,
}

impl RawRelationship {
  pub fn into_relationship(self) -> Result<PersonRelationship> {
    Ok(PersonRelationship {
      relationship_id:   decode_uuid(&self.relationship_id)?,
      person_id:         decode_uuid(&self.person_id)?,
      related_person_id: decode_uuid(&self.related_person_id)?,
      kind:              self.kind,
      source:            decode_relationship_source(&self.source)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}
