//! People — the registry that mentions and facts resolve against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Where a person record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonSource {
  /// Synced in from the device contact book.
  PhoneContact,
  /// Created inside the app, e.g. a new person confirmed during a commit.
  AppLocal,
}

impl PersonSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      PersonSource::PhoneContact => "phone_contact",
      PersonSource::AppLocal => "app_local",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "phone_contact" => Some(PersonSource::PhoneContact),
      "app_local" => Some(PersonSource::AppLocal),
      _ => None,
    }
  }
}

/// A known person in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:           Uuid,
  pub first_name:          String,
  pub last_name:           String,
  pub source:              PersonSource,
  /// Contact-book identifier; set exactly when `source` is
  /// [`PersonSource::PhoneContact`].
  pub external_contact_id: Option<String>,
  pub created_at:          DateTime<Utc>,
}

impl Person {
  /// "First Last", or just the first name when no last name is known.
  pub fn display_name(&self) -> String {
    if self.last_name.is_empty() {
      self.first_name.clone()
    } else {
      format!("{} {}", self.first_name, self.last_name)
    }
  }
}

/// Input to [`crate::store::PersonStore::add_person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
  pub first_name:          String,
  pub last_name:           String,
  pub source:              PersonSource,
  pub external_contact_id: Option<String>,
}

impl NewPerson {
  pub fn app_local(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    NewPerson {
      first_name:          first_name.into(),
      last_name:           last_name.into(),
      source:              PersonSource::AppLocal,
      external_contact_id: None,
    }
  }

  pub fn phone_contact(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    external_contact_id: impl Into<String>,
  ) -> Self {
    NewPerson {
      first_name:          first_name.into(),
      last_name:           last_name.into(),
      source:              PersonSource::PhoneContact,
      external_contact_id: Some(external_contact_id.into()),
    }
  }

  /// Split a free-text name into an app-local person: first token becomes
  /// the first name, the remainder the last name.
  pub fn from_display_name(name: &str) -> Self {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_owned();
    let last = parts.collect::<Vec<_>>().join(" ");
    NewPerson::app_local(first, last)
  }

  /// `external_contact_id` must be present exactly when the source is the
  /// phone contact book.
  pub fn validate(&self) -> Result<()> {
    let wants_contact_id = self.source == PersonSource::PhoneContact;
    if wants_contact_id == self.external_contact_id.is_some() {
      Ok(())
    } else {
      Err(Error::ExternalContactIdMismatch)
    }
  }
}
