//! Read-time derivation of time-sensitive fact values.
//!
//! Stored values are never rewritten as time passes. A fact captured as
//! "she is 32" on some date stays "32" in the ledger; display code derives
//! "33" a year later by applying the fact's progression to the stored
//! baseline. Everything here is pure: same inputs, same output.

use chrono::{Datelike, NaiveDate, Utc};

use crate::fact::{Fact, TimeProgression};

/// Ordinal tokens recognized in academic-year values, in progression order.
const ORDINALS: [&str; 10] =
  ["1st", "2nd", "3rd", "4th", "5th", "6th", "7th", "8th", "9th", "10th"];

/// The display value of `fact` as of the given date.
///
/// Facts that are not time-sensitive, or that lack a baseline date or a
/// progression, come back unchanged.
pub fn current_value(fact: &Fact, as_of: NaiveDate) -> String {
  if !fact.is_time_sensitive {
    return fact.value.clone();
  }
  let (Some(fact_date), Some(progression)) = (fact.fact_date, fact.time_progression) else {
    return fact.value.clone();
  };

  match progression {
    TimeProgression::Age => advance_age(&fact.value, years_between(fact_date, as_of)),
    TimeProgression::AcademicYear => {
      advance_academic_year(&fact.value, years_between(fact_date, as_of))
    }
    TimeProgression::Tenure => format_tenure(fact_date, as_of),
  }
}

/// [`current_value`] as of today (UTC).
pub fn current_value_today(fact: &Fact) -> String {
  current_value(fact, Utc::now().date_naive())
}

/// Whole calendar years from `from` to `to`, clamped at zero.
fn years_between(from: NaiveDate, to: NaiveDate) -> i32 {
  if to <= from {
    return 0;
  }
  let mut years = to.year() - from.year();
  if (to.month(), to.day()) < (from.month(), from.day()) {
    years -= 1;
  }
  years.max(0)
}

/// Whole months from `from` to `to`, clamped at zero.
fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
  if to <= from {
    return 0;
  }
  let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
  if to.day() < from.day() {
    months -= 1;
  }
  months.max(0)
}

fn advance_age(value: &str, years_passed: i32) -> String {
  match value.trim().parse::<i64>() {
    Ok(age) => (age + i64::from(years_passed)).to_string(),
    Err(_) => value.to_owned(),
  }
}

fn advance_academic_year(value: &str, years_passed: i32) -> String {
  let Some((at, index)) = find_ordinal(value) else {
    return value.to_owned();
  };
  let advanced = (index + years_passed as usize).min(ORDINALS.len() - 1);
  let token = ORDINALS[index];
  let mut out = String::with_capacity(value.len() + 2);
  out.push_str(&value[..at]);
  out.push_str(ORDINALS[advanced]);
  out.push_str(&value[at + token.len()..]);
  out
}

fn format_tenure(from: NaiveDate, to: NaiveDate) -> String {
  let total = months_between(from, to);
  let years = total / 12;
  let months = total % 12;
  if years == 0 {
    count_unit(months, "month")
  } else {
    format!("{}, {}", count_unit(years, "year"), count_unit(months, "month"))
  }
}

fn count_unit(n: i32, unit: &str) -> String {
  if n == 1 {
    format!("1 {unit}")
  } else {
    format!("{n} {unit}s")
  }
}

/// Earliest occurrence of any ordinal token in `value` that sits on word
/// boundaries, as `(byte offset, table index)`. Boundary checking keeps
/// "21st" from matching the "1st" entry.
fn find_ordinal(value: &str) -> Option<(usize, usize)> {
  let mut best: Option<(usize, usize)> = None;
  for (index, token) in ORDINALS.iter().enumerate() {
    let mut from = 0;
    while let Some(found) = value[from..].find(token) {
      let at = from + found;
      if on_word_boundaries(value, at, at + token.len()) {
        if best.is_none_or(|(best_at, _)| at < best_at) {
          best = Some((at, index));
        }
        break;
      }
      // tokens start with an ascii digit, so at + 1 is a char boundary
      from = at + 1;
    }
  }
  best
}

fn on_word_boundaries(value: &str, start: usize, end: usize) -> bool {
  let before = value[..start].chars().next_back();
  let after = value[end..].chars().next();
  before.is_none_or(|c| !c.is_alphanumeric()) && after.is_none_or(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::fact::FactCategory;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn fact(value: &str, fact_date: NaiveDate, progression: TimeProgression) -> Fact {
    Fact {
      fact_id:           Uuid::new_v4(),
      person_id:         Uuid::new_v4(),
      touchpoint_id:     None,
      category:          FactCategory::General,
      key:               "k".to_owned(),
      value:             value.to_owned(),
      fact_date:         Some(fact_date),
      is_time_sensitive: true,
      time_progression:  Some(progression),
      is_superseded:     false,
      superseded_by:     None,
      extracted_at:      Utc::now(),
      confidence:        1.0,
    }
  }

  #[test]
  fn plain_facts_pass_through() {
    let mut f = fact("32", date(2020, 1, 1), TimeProgression::Age);
    f.is_time_sensitive = false;
    assert_eq!(current_value(&f, date(2025, 1, 1)), "32");
  }

  #[test]
  fn missing_baseline_date_passes_through() {
    let mut f = fact("32", date(2020, 1, 1), TimeProgression::Age);
    f.fact_date = None;
    assert_eq!(current_value(&f, date(2025, 1, 1)), "32");
  }

  #[test]
  fn age_advances_by_whole_calendar_years() {
    let f = fact("32", date(2023, 6, 15), TimeProgression::Age);
    assert_eq!(current_value(&f, date(2024, 6, 14)), "32");
    assert_eq!(current_value(&f, date(2024, 6, 15)), "33");
    assert_eq!(current_value(&f, date(2026, 1, 2)), "34");
  }

  #[test]
  fn non_numeric_age_is_left_alone() {
    let f = fact("early thirties", date(2023, 6, 15), TimeProgression::Age);
    assert_eq!(current_value(&f, date(2025, 6, 15)), "early thirties");
  }

  #[test]
  fn as_of_before_fact_date_never_goes_backwards() {
    let f = fact("32", date(2023, 6, 15), TimeProgression::Age);
    assert_eq!(current_value(&f, date(2020, 1, 1)), "32");
  }

  #[test]
  fn academic_year_advances_the_ordinal() {
    let f = fact("3rd year Engineering", date(2023, 9, 1), TimeProgression::AcademicYear);
    assert_eq!(current_value(&f, date(2024, 9, 1)), "4th year Engineering");
    assert_eq!(current_value(&f, date(2025, 10, 1)), "5th year Engineering");
  }

  #[test]
  fn academic_year_clamps_at_the_table_end() {
    let f = fact("9th year", date(2020, 9, 1), TimeProgression::AcademicYear);
    assert_eq!(current_value(&f, date(2030, 9, 1)), "10th year");
  }

  #[test]
  fn academic_year_without_ordinal_passes_through() {
    let f = fact("final year", date(2023, 9, 1), TimeProgression::AcademicYear);
    assert_eq!(current_value(&f, date(2024, 9, 1)), "final year");
  }

  #[test]
  fn academic_year_ignores_embedded_digits() {
    // "21st" must not match the "1st" table entry
    let f = fact("21st century studies, 2nd year", date(2023, 9, 1), TimeProgression::AcademicYear);
    assert_eq!(
      current_value(&f, date(2024, 9, 1)),
      "21st century studies, 3rd year"
    );
  }

  #[test]
  fn tenure_under_a_year_is_months_only() {
    let f = fact("new hire", date(2024, 1, 15), TimeProgression::Tenure);
    assert_eq!(current_value(&f, date(2024, 7, 15)), "6 months");
  }

  #[test]
  fn tenure_formats_singular_and_plural() {
    let f = fact("", date(2024, 1, 15), TimeProgression::Tenure);
    assert_eq!(current_value(&f, date(2024, 2, 15)), "1 month");
    assert_eq!(current_value(&f, date(2025, 2, 20)), "1 year, 1 month");
    assert_eq!(current_value(&f, date(2026, 5, 15)), "2 years, 4 months");
  }

  #[test]
  fn tenure_clamps_at_zero() {
    let f = fact("", date(2024, 6, 1), TimeProgression::Tenure);
    assert_eq!(current_value(&f, date(2024, 1, 1)), "0 months");
  }

  #[test]
  fn repeated_calls_are_stable() {
    let f = fact("32", date(2023, 6, 15), TimeProgression::Age);
    let first = current_value(&f, date(2025, 1, 1));
    let second = current_value(&f, date(2025, 1, 1));
    assert_eq!(first, second);
  }
}
