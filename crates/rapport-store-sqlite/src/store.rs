//! [`SqliteStore`] — the SQLite implementation of [`PersonStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rapport_core::{
  commit::{CommitOutcome, CommitPlan, PersonRef, RecordedFact},
  fact::{Fact, FactCategory, NewFact},
  person::{NewPerson, Person},
  relationship::{NewRelationship, PersonRelationship, RelationshipOutcome},
  store::PersonStore,
  touchpoint::{NewTouchpoint, Touchpoint},
};

use crate::{
  encode::{
    decode_uuid, encode_date, encode_dt, encode_uuid, RawFact, RawPerson, RawRelationship,
    RawTouchpoint,
  },
  schema::SCHEMA,
  Error, Result,
};

const PERSON_COLUMNS: &str =
  "person_id, first_name, last_name, source, external_contact_id, created_at";
const TOUCHPOINT_COLUMNS: &str =
  "touchpoint_id, primary_person_id, raw_note, summary, interaction_type, occurred_at, created_at";
const FACT_COLUMNS: &str =
  "fact_id, person_id, touchpoint_id, category, key, value, fact_date, is_time_sensitive, \
   time_progression, is_superseded, superseded_by, extracted_at, confidence";
const RELATIONSHIP_COLUMNS: &str =
  "relationship_id, person_id, related_person_id, kind, source, created_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rapport person store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// funnels through that one connection's worker thread, which is what makes
/// the read-check-write sequences in [`PersonStore::record_fact`] and
/// [`PersonStore::commit_extraction`] safe without extra locking.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    input.validate()?;

    let person = Person {
      person_id:           Uuid::new_v4(),
      first_name:          input.first_name,
      last_name:           input.last_name,
      source:              input.source,
      external_contact_id: input.external_contact_id,
      created_at:          Utc::now(),
    };

    let row = person.clone();
    self
      .conn
      .call(move |conn| {
        insert_person_row(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
              rusqlite::params![id_str],
              read_person,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons
           ORDER BY first_name COLLATE NOCASE, last_name COLLATE NOCASE"
        ))?;
        let rows = stmt
          .query_map([], read_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Touchpoints ───────────────────────────────────────────────────────────

  async fn add_touchpoint(&self, input: NewTouchpoint) -> Result<Touchpoint> {
    let touchpoint = Touchpoint {
      touchpoint_id:     Uuid::new_v4(),
      primary_person_id: input.primary_person_id,
      raw_note:          input.raw_note,
      summary:           None,
      interaction_type:  input.interaction_type,
      occurred_at:       input.occurred_at,
      created_at:        Utc::now(),
      mentioned_people:  Vec::new(),
    };

    let row = touchpoint.clone();
    self
      .conn
      .call(move |conn| {
        if let Some(primary) = row.primary_person_id {
          if !person_exists(conn, &encode_uuid(primary))? {
            return Ok(Err(Error::PersonNotFound(primary)));
          }
        }
        conn.execute(
          &format!("INSERT INTO touchpoints ({TOUCHPOINT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
          rusqlite::params![
            encode_uuid(row.touchpoint_id),
            row.primary_person_id.map(encode_uuid),
            row.raw_note,
            row.summary,
            row.interaction_type.as_str(),
            encode_dt(row.occurred_at),
            encode_dt(row.created_at),
          ],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(touchpoint)
  }

  async fn get_touchpoint(&self, id: Uuid) -> Result<Option<Touchpoint>> {
    let id_str = encode_uuid(id);

    let found: Option<(RawTouchpoint, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {TOUCHPOINT_COLUMNS} FROM touchpoints WHERE touchpoint_id = ?1"),
            rusqlite::params![id_str],
            read_touchpoint,
          )
          .optional()?;
        let Some(raw) = raw else { return Ok(None) };
        let mentioned = mention_rows(conn, &id_str)?;
        Ok(Some((raw, mentioned)))
      })
      .await?;

    found
      .map(|(raw, mentioned)| raw.into_touchpoint(mentioned))
      .transpose()
  }

  async fn list_touchpoints(&self, person_id: Uuid) -> Result<Vec<Touchpoint>> {
    let person_str = encode_uuid(person_id);

    let raws: Vec<(RawTouchpoint, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOUCHPOINT_COLUMNS} FROM touchpoints
           WHERE primary_person_id = ?1
           ORDER BY occurred_at DESC"
        ))?;
        let touchpoints = stmt
          .query_map(rusqlite::params![person_str], read_touchpoint)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(touchpoints.len());
        for raw in touchpoints {
          let mentioned = mention_rows(conn, &raw.touchpoint_id)?;
          rows.push((raw, mentioned));
        }
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, mentioned)| raw.into_touchpoint(mentioned))
      .collect()
  }

  // ── Facts — append-only writes ────────────────────────────────────────────

  async fn record_fact(&self, input: NewFact) -> Result<RecordedFact> {
    let fact = Fact {
      fact_id:           Uuid::new_v4(),
      person_id:         input.person_id,
      touchpoint_id:     input.touchpoint_id,
      category:          input.category,
      key:               input.key,
      value:             input.value,
      fact_date:         input.fact_date,
      is_time_sensitive: input.is_time_sensitive,
      time_progression:  input.time_progression,
      is_superseded:     false,
      superseded_by:     None,
      extracted_at:      Utc::now(),
      confidence:        input.confidence,
    };

    let row = fact.clone();
    let superseded_str = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !person_exists(&tx, &encode_uuid(row.person_id))? {
          return Ok(Err(Error::PersonNotFound(row.person_id)));
        }
        if let Some(touchpoint_id) = row.touchpoint_id {
          if !touchpoint_exists(&tx, &encode_uuid(touchpoint_id))? {
            return Ok(Err(Error::TouchpointNotFound(touchpoint_id)));
          }
        }
        let old = insert_fact_row(&tx, &row)?;
        tx.commit()?;
        Ok(Ok(old))
      })
      .await??;

    let superseded = superseded_str.as_deref().map(decode_uuid).transpose()?;
    Ok(RecordedFact { fact, superseded })
  }

  async fn get_fact(&self, id: Uuid) -> Result<Option<Fact>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FACT_COLUMNS} FROM facts WHERE fact_id = ?1"),
              rusqlite::params![id_str],
              read_fact,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFact::into_fact).transpose()
  }

  async fn facts_for(&self, person_id: Uuid, include_superseded: bool) -> Result<Vec<Fact>> {
    let person_str = encode_uuid(person_id);

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let filter = if include_superseded { "" } else { "AND is_superseded = 0" };
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS} FROM facts
           WHERE person_id = ?1 {filter}
           ORDER BY extracted_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_str], read_fact)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  async fn fact_history(
    &self,
    person_id: Uuid,
    category: FactCategory,
    key: &str,
  ) -> Result<Vec<Fact>> {
    let person_str = encode_uuid(person_id);
    let category_str = category.as_str();
    let key = key.to_owned();

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS} FROM facts
           WHERE person_id = ?1 AND category = ?2 AND key = ?3 COLLATE NOCASE
           ORDER BY extracted_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_str, category_str, key], read_fact)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  // ── Relationships ─────────────────────────────────────────────────────────

  async fn add_relationship(&self, input: NewRelationship) -> Result<RelationshipOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !person_exists(&tx, &encode_uuid(input.person_id))? {
          return Ok(Err(Error::PersonNotFound(input.person_id)));
        }
        if !person_exists(&tx, &encode_uuid(input.related_person_id))? {
          return Ok(Err(Error::PersonNotFound(input.related_person_id)));
        }
        let outcome = match create_or_skip_relationship(&tx, input) {
          Ok(outcome) => outcome,
          Err(err) => return Ok(Err(err)),
        };
        tx.commit()?;
        Ok(Ok(outcome))
      })
      .await??;

    Ok(outcome)
  }

  async fn relationships_for(&self, person_id: Uuid) -> Result<Vec<PersonRelationship>> {
    let person_str = encode_uuid(person_id);

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
           WHERE person_id = ?1
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_str], read_relationship)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRelationship::into_relationship)
      .collect()
  }

  // ── Extraction commit ─────────────────────────────────────────────────────

  async fn commit_extraction(&self, plan: CommitPlan) -> Result<CommitOutcome> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = match apply_plan(&tx, plan) {
          Ok(outcome) => outcome,
          Err(err) => return Ok(Err(err)),
        };
        tx.commit()?;
        Ok(Ok(outcome))
      })
      .await?
  }
}

// ─── Plan application ────────────────────────────────────────────────────────

/// Apply a commit plan inside an open transaction.
///
/// Any error out of here aborts the transaction (rollback on drop), so a
/// failed plan leaves no trace in the store.
fn apply_plan(tx: &rusqlite::Transaction<'_>, plan: CommitPlan) -> Result<CommitOutcome> {
  let touchpoint_str = encode_uuid(plan.touchpoint_id);
  if !touchpoint_exists(tx, &touchpoint_str)? {
    return Err(Error::TouchpointNotFound(plan.touchpoint_id));
  }

  let mut created_persons = Vec::with_capacity(plan.new_persons.len());
  for input in plan.new_persons {
    input.validate()?;
    let person = Person {
      person_id:           Uuid::new_v4(),
      first_name:          input.first_name,
      last_name:           input.last_name,
      source:              input.source,
      external_contact_id: input.external_contact_id,
      created_at:          Utc::now(),
    };
    insert_person_row(tx, &person)?;
    created_persons.push(person);
  }

  let resolve = |person: PersonRef| -> Result<Uuid> {
    match person {
      PersonRef::Existing(id) => {
        if person_exists(tx, &encode_uuid(id))? {
          Ok(id)
        } else {
          Err(Error::PersonNotFound(id))
        }
      }
      PersonRef::Created(index) => created_persons
        .get(index)
        .map(|p| p.person_id)
        .ok_or(Error::Core(rapport_core::Error::InvalidPersonRef(index))),
    }
  };

  // The UNIQUE pair constraint makes INSERT OR IGNORE the dedup check:
  // zero rows changed means the link already existed.
  let mut linked_mentions = Vec::new();
  for reference in plan.mentions {
    let person_id = resolve(reference)?;
    let inserted = tx.execute(
      "INSERT OR IGNORE INTO touchpoint_mentions (touchpoint_id, person_id) VALUES (?1, ?2)",
      rusqlite::params![touchpoint_str, encode_uuid(person_id)],
    )?;
    if inserted > 0 {
      linked_mentions.push(person_id);
    }
  }

  let mut relationships = Vec::with_capacity(plan.relationships.len());
  for planned in plan.relationships {
    let input = NewRelationship {
      person_id:         resolve(planned.person)?,
      related_person_id: resolve(planned.related)?,
      kind:              planned.kind,
      source:            planned.source,
    };
    relationships.push(create_or_skip_relationship(tx, input)?);
  }

  let mut facts = Vec::with_capacity(plan.facts.len());
  for planned in plan.facts {
    let person_id = resolve(planned.person)?;
    let fact = Fact {
      fact_id:           Uuid::new_v4(),
      person_id,
      touchpoint_id:     Some(plan.touchpoint_id),
      category:          planned.category,
      key:               planned.key,
      value:             planned.value,
      fact_date:         planned.fact_date,
      is_time_sensitive: planned.is_time_sensitive,
      time_progression:  planned.time_progression,
      is_superseded:     false,
      superseded_by:     None,
      extracted_at:      Utc::now(),
      confidence:        planned.confidence,
    };
    let superseded = insert_fact_row(tx, &fact)?
      .as_deref()
      .map(decode_uuid)
      .transpose()?;
    facts.push(RecordedFact { fact, superseded });
  }

  let summary_updated = if let Some(summary) = plan.summary {
    tx.execute(
      "UPDATE touchpoints SET summary = ?1 WHERE touchpoint_id = ?2",
      rusqlite::params![summary, touchpoint_str],
    )?;
    true
  } else {
    false
  };

  Ok(CommitOutcome {
    touchpoint_id: plan.touchpoint_id,
    created_persons,
    linked_mentions,
    relationships,
    facts,
    summary_updated,
  })
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    person_id:           row.get(0)?,
    first_name:          row.get(1)?,
    last_name:           row.get(2)?,
    source:              row.get(3)?,
    external_contact_id: row.get(4)?,
    created_at:          row.get(5)?,
  })
}

fn read_touchpoint(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTouchpoint> {
  Ok(RawTouchpoint {
    touchpoint_id:     row.get(0)?,
    primary_person_id: row.get(1)?,
    raw_note:          row.get(2)?,
    summary:           row.get(3)?,
    interaction_type:  row.get(4)?,
    occurred_at:       row.get(5)?,
    created_at:        row.get(6)?,
  })
}

fn read_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFact> {
  Ok(RawFact {
    fact_id:           row.get(0)?,
    person_id:         row.get(1)?,
    touchpoint_id:     row.get(2)?,
    category:          row.get(3)?,
    key:               row.get(4)?,
    value:             row.get(5)?,
    fact_date:         row.get(6)?,
    is_time_sensitive: row.get(7)?,
    time_progression:  row.get(8)?,
    is_superseded:     row.get(9)?,
    superseded_by:     row.get(10)?,
    extracted_at:      row.get(11)?,
    confidence:        row.get(12)?,
  })
}

fn read_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRelationship> {
  Ok(RawRelationship {
    relationship_id:   row.get(0)?,
    person_id:         row.get(1)?,
    related_person_id: row.get(2)?,
    kind:              row.get(3)?,
    source:            row.get(4)?,
    created_at:        row.get(5)?,
  })
}

fn person_exists(conn: &rusqlite::Connection, person_id: &str) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT 1 FROM persons WHERE person_id = ?1",
      rusqlite::params![person_id],
      |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
}

fn touchpoint_exists(conn: &rusqlite::Connection, touchpoint_id: &str) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT 1 FROM touchpoints WHERE touchpoint_id = ?1",
      rusqlite::params![touchpoint_id],
      |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
}

fn mention_rows(conn: &rusqlite::Connection, touchpoint_id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT person_id FROM touchpoint_mentions WHERE touchpoint_id = ?1 ORDER BY rowid",
  )?;
  stmt
    .query_map(rusqlite::params![touchpoint_id], |row| row.get(0))?
    .collect()
}

fn insert_person_row(conn: &rusqlite::Connection, person: &Person) -> rusqlite::Result<()> {
  conn.execute(
    &format!("INSERT INTO persons ({PERSON_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
    rusqlite::params![
      encode_uuid(person.person_id),
      person.first_name,
      person.last_name,
      person.source.as_str(),
      person.external_contact_id,
      encode_dt(person.created_at),
    ],
  )?;
  Ok(())
}

/// Supersede any active fact for the same `(person, category, key)` — key
/// compared case-insensitively — then insert the replacement row. Returns
/// the superseded fact id, if any.
fn insert_fact_row(conn: &rusqlite::Connection, fact: &Fact) -> rusqlite::Result<Option<String>> {
  let old_id: Option<String> = conn
    .query_row(
      "SELECT fact_id FROM facts
       WHERE person_id = ?1 AND category = ?2 AND key = ?3 COLLATE NOCASE
         AND is_superseded = 0",
      rusqlite::params![encode_uuid(fact.person_id), fact.category.as_str(), fact.key],
      |row| row.get(0),
    )
    .optional()?;

  if let Some(old) = &old_id {
    conn.execute(
      "UPDATE facts SET is_superseded = 1, superseded_by = ?1 WHERE fact_id = ?2",
      rusqlite::params![encode_uuid(fact.fact_id), old],
    )?;
  }

  conn.execute(
    &format!(
      "INSERT INTO facts ({FACT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    ),
    rusqlite::params![
      encode_uuid(fact.fact_id),
      encode_uuid(fact.person_id),
      fact.touchpoint_id.map(encode_uuid),
      fact.category.as_str(),
      fact.key,
      fact.value,
      fact.fact_date.map(encode_date),
      fact.is_time_sensitive,
      fact.time_progression.map(|p| p.as_str()),
      fact.is_superseded,
      fact.superseded_by.map(encode_uuid),
      encode_dt(fact.extracted_at),
      fact.confidence,
    ],
  )?;

  Ok(old_id)
}

fn find_relationship(
  conn: &rusqlite::Connection,
  person_id: &str,
  related_id: &str,
) -> rusqlite::Result<Option<RawRelationship>> {
  conn
    .query_row(
      &format!(
        "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
         WHERE person_id = ?1 AND related_person_id = ?2"
      ),
      rusqlite::params![person_id, related_id],
      read_relationship,
    )
    .optional()
}

/// Insert a directed edge, or return the existing edge for the same pair.
/// The stored kind wins over the incoming one.
fn create_or_skip_relationship(
  conn: &rusqlite::Connection,
  input: NewRelationship,
) -> Result<RelationshipOutcome> {
  let person_str = encode_uuid(input.person_id);
  let related_str = encode_uuid(input.related_person_id);

  if let Some(existing) = find_relationship(conn, &person_str, &related_str)? {
    return Ok(RelationshipOutcome::Skipped(existing.into_relationship()?));
  }

  let edge = PersonRelationship {
    relationship_id:   Uuid::new_v4(),
    person_id:         input.person_id,
    related_person_id: input.related_person_id,
    kind:              input.kind,
    source:            input.source,
    created_at:        Utc::now(),
  };

  conn.execute(
    &format!(
      "INSERT INTO relationships ({RELATIONSHIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ),
    rusqlite::params![
      encode_uuid(edge.relationship_id),
      person_str,
      related_str,
      edge.kind,
      edge.source.as_str(),
      encode_dt(edge.created_at),
    ],
  )?;

  Ok(RelationshipOutcome::Created(edge))
}
