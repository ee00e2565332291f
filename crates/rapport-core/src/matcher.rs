//! Fuzzy name matching between free-text mentions and the person registry.
//!
//! A mention like "Sara Kim" rarely spells a registry entry exactly. The
//! matcher scores every registry person against the mention and tags how
//! each score was derived, so callers can auto-bind confident hits and put
//! the rest in front of a reviewer.

use serde::{Deserialize, Serialize};

use crate::person::Person;

/// Default cutoff below which candidates are not worth surfacing.
pub const MATCH_THRESHOLD: f64 = 0.5;
/// Default cutoff for accepting a single best candidate.
pub const BEST_MATCH_CONFIDENCE: f64 = 0.7;

/// How a candidate's score was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
  ExactFullName,
  ExactFirstName,
  PartialLastName,
  FuzzyFirstName,
  FuzzyFullName,
}

/// A scored candidate binding between a mention and a registry person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameMatch {
  pub person: Person,
  pub score:  f64,
  pub kind:   MatchKind,
}

/// Normalized edit-distance similarity in `[0, 1]`.
///
/// Case-insensitive and whitespace-trimmed; equal strings score 1.0, and if
/// either side is empty the score is 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
  let a = normalize(a);
  let b = normalize(b);
  if a == b {
    return 1.0;
  }
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }
  let distance = strsim::levenshtein(&a, &b) as f64;
  let longest = a.chars().count().max(b.chars().count()) as f64;
  1.0 - distance / longest
}

/// Rank registry persons against a free-text `name`.
///
/// The name is split into a first token and an optional remainder; the
/// remainder is matched against last names. Candidates scoring below
/// `threshold` are dropped, the rest come back sorted by score descending.
pub fn find_matches(name: &str, registry: &[Person], threshold: f64) -> Vec<NameMatch> {
  let mut parts = name.split_whitespace();
  let Some(first) = parts.next() else {
    return Vec::new();
  };
  let remainder = parts.collect::<Vec<_>>().join(" ");
  let remainder = (!remainder.is_empty()).then_some(remainder);

  let mut matches: Vec<NameMatch> = registry
    .iter()
    .map(|person| {
      let (score, kind) = score_person(first, remainder.as_deref(), person);
      NameMatch { person: person.clone(), score, kind }
    })
    .filter(|candidate| candidate.score >= threshold)
    .collect();

  matches.sort_by(|a, b| b.score.total_cmp(&a.score));
  matches
}

/// The single most plausible registry person for `name`, if any candidate
/// clears `minimum_confidence`.
pub fn best_match(name: &str, registry: &[Person], minimum_confidence: f64) -> Option<NameMatch> {
  find_matches(name, registry, minimum_confidence).into_iter().next()
}

fn score_person(first: &str, remainder: Option<&str>, person: &Person) -> (f64, MatchKind) {
  let query_first = normalize(first);
  let person_first = normalize(&person.first_name);
  let person_last = normalize(&person.last_name);
  let first_exact = !query_first.is_empty() && query_first == person_first;

  match (first_exact, remainder) {
    (true, Some(rest)) if normalize(rest) == person_last => (1.0, MatchKind::ExactFullName),
    (true, Some(rest)) => {
      let last_sim = similarity(rest, &person.last_name);
      let kind = if last_sim >= 0.8 {
        MatchKind::ExactFullName
      } else {
        MatchKind::PartialLastName
      };
      (0.7 + 0.3 * last_sim, kind)
    }
    (true, None) => (0.9, MatchKind::ExactFirstName),
    (false, None) => (similarity(first, &person.first_name) * 0.9, MatchKind::FuzzyFirstName),
    (false, Some(rest)) => {
      let first_sim = similarity(first, &person.first_name);
      let last_sim = similarity(rest, &person.last_name);
      let kind = if first_sim >= 0.8 && last_sim < 0.8 {
        MatchKind::FuzzyFirstName
      } else {
        MatchKind::FuzzyFullName
      };
      (0.7 * first_sim + 0.3 * last_sim, kind)
    }
  }
}

fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}
