//! Facts — the append-only ledger of things learned about people.
//!
//! A fact is never updated in place. Recording a new value for the same
//! `(person, category, key)` marks the old row superseded and links it to
//! its replacement, so at most one version is ever active.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of fact this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
  Work,
  Education,
  Family,
  Health,
  Interest,
  Location,
  Milestone,
  Preference,
  General,
}

impl FactCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      FactCategory::Work => "work",
      FactCategory::Education => "education",
      FactCategory::Family => "family",
      FactCategory::Health => "health",
      FactCategory::Interest => "interest",
      FactCategory::Location => "location",
      FactCategory::Milestone => "milestone",
      FactCategory::Preference => "preference",
      FactCategory::General => "general",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "work" => Some(FactCategory::Work),
      "education" => Some(FactCategory::Education),
      "family" => Some(FactCategory::Family),
      "health" => Some(FactCategory::Health),
      "interest" => Some(FactCategory::Interest),
      "location" => Some(FactCategory::Location),
      "milestone" => Some(FactCategory::Milestone),
      "preference" => Some(FactCategory::Preference),
      "general" => Some(FactCategory::General),
      _ => None,
    }
  }

  /// Lenient variant for collaborator output: anything unrecognized lands
  /// in [`FactCategory::General`].
  pub fn parse_or_general(s: &str) -> Self {
    FactCategory::parse(&s.trim().to_lowercase()).unwrap_or(FactCategory::General)
  }
}

/// How a time-sensitive value drifts as calendar time passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeProgression {
  /// Ordinal study years: "3rd year" becomes "4th year".
  AcademicYear,
  /// Integer ages: "32" becomes "33".
  Age,
  /// Durations re-derived from the fact date: "6 months", "2 years, 1 month".
  Tenure,
}

impl TimeProgression {
  pub fn as_str(&self) -> &'static str {
    match self {
      TimeProgression::AcademicYear => "academic_year",
      TimeProgression::Age => "age",
      TimeProgression::Tenure => "tenure",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "academic_year" => Some(TimeProgression::AcademicYear),
      "age" => Some(TimeProgression::Age),
      "tenure" => Some(TimeProgression::Tenure),
      _ => None,
    }
  }
}

/// One version of a fact, as stored.
///
/// `value` is the baseline as captured on `fact_date`; use
/// [`crate::temporal::current_value`] for display so time-sensitive values
/// stay fresh without rewriting the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
  pub fact_id:           Uuid,
  pub person_id:         Uuid,
  /// Source touchpoint; `None` for facts recorded directly via the API.
  pub touchpoint_id:     Option<Uuid>,
  pub category:          FactCategory,
  /// Normalized attribute name within the category, e.g. "employer".
  pub key:               String,
  pub value:             String,
  /// When the value was true, used as the baseline for progression.
  pub fact_date:         Option<NaiveDate>,
  pub is_time_sensitive: bool,
  pub time_progression:  Option<TimeProgression>,
  pub is_superseded:     bool,
  pub superseded_by:     Option<Uuid>,
  pub extracted_at:      DateTime<Utc>,
  pub confidence:        f64,
}

/// Input to [`crate::store::PersonStore::record_fact`].
#[derive(Debug, Clone)]
pub struct NewFact {
  pub person_id:         Uuid,
  pub touchpoint_id:     Option<Uuid>,
  pub category:          FactCategory,
  pub key:               String,
  pub value:             String,
  pub fact_date:         Option<NaiveDate>,
  pub is_time_sensitive: bool,
  pub time_progression:  Option<TimeProgression>,
  pub confidence:        f64,
}

impl NewFact {
  /// A plain, fully-trusted fact with no temporal behavior.
  pub fn new(
    person_id: Uuid,
    category: FactCategory,
    key: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    NewFact {
      person_id,
      touchpoint_id: None,
      category,
      key: key.into(),
      value: value.into(),
      fact_date: None,
      is_time_sensitive: false,
      time_progression: None,
      confidence: 1.0,
    }
  }

  pub fn with_touchpoint(mut self, touchpoint_id: Uuid) -> Self {
    self.touchpoint_id = Some(touchpoint_id);
    self
  }

  pub fn with_progression(mut self, date: NaiveDate, progression: TimeProgression) -> Self {
    self.fact_date = Some(date);
    self.is_time_sensitive = true;
    self.time_progression = Some(progression);
    self
  }

  pub fn with_confidence(mut self, confidence: f64) -> Self {
    self.confidence = confidence;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_parse_round_trips() {
    for category in [
      FactCategory::Work,
      FactCategory::Education,
      FactCategory::Family,
      FactCategory::Health,
      FactCategory::Interest,
      FactCategory::Location,
      FactCategory::Milestone,
      FactCategory::Preference,
      FactCategory::General,
    ] {
      assert_eq!(FactCategory::parse(category.as_str()), Some(category));
    }
  }

  #[test]
  fn unknown_category_falls_back_to_general() {
    assert_eq!(FactCategory::parse_or_general("Work"), FactCategory::Work);
    assert_eq!(FactCategory::parse_or_general("astrology"), FactCategory::General);
    assert_eq!(FactCategory::parse_or_general(""), FactCategory::General);
  }

  #[test]
  fn progression_parse_rejects_unknown() {
    assert_eq!(TimeProgression::parse("age"), Some(TimeProgression::Age));
    assert_eq!(TimeProgression::parse("none"), None);
    assert_eq!(TimeProgression::parse("decade"), None);
  }
}
