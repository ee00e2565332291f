//! SQL schema for the rapport SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id           TEXT PRIMARY KEY,
    first_name          TEXT NOT NULL,
    last_name           TEXT NOT NULL,
    source              TEXT NOT NULL,   -- 'phone_contact' | 'app_local'
    external_contact_id TEXT,            -- set exactly when source = 'phone_contact'
    created_at          TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS touchpoints (
    touchpoint_id     TEXT PRIMARY KEY,
    primary_person_id TEXT REFERENCES persons(person_id),
    raw_note          TEXT NOT NULL,     -- verbatim; never modified
    summary           TEXT,              -- engine-written digest, NULL until a commit
    interaction_type  TEXT NOT NULL,
    occurred_at       TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

-- People linked to a touchpoint by extraction commits.
CREATE TABLE IF NOT EXISTS touchpoint_mentions (
    touchpoint_id TEXT NOT NULL REFERENCES touchpoints(touchpoint_id),
    person_id     TEXT NOT NULL REFERENCES persons(person_id),
    UNIQUE (touchpoint_id, person_id)
);

-- The fact ledger. Rows are never deleted and values are never edited;
-- the one permitted UPDATE flips is_superseded when a replacement lands.
CREATE TABLE IF NOT EXISTS facts (
    fact_id           TEXT PRIMARY KEY,
    person_id         TEXT NOT NULL REFERENCES persons(person_id),
    touchpoint_id     TEXT REFERENCES touchpoints(touchpoint_id),
    category          TEXT NOT NULL,
    key               TEXT NOT NULL,
    value             TEXT NOT NULL,
    fact_date         TEXT,              -- ISO 8601 date, baseline for progression
    is_time_sensitive INTEGER NOT NULL DEFAULT 0,
    time_progression  TEXT,              -- 'academic_year' | 'age' | 'tenure'
    is_superseded     INTEGER NOT NULL DEFAULT 0,
    superseded_by     TEXT REFERENCES facts(fact_id) DEFERRABLE INITIALLY DEFERRED,
    extracted_at      TEXT NOT NULL,     -- server-assigned
    confidence        REAL NOT NULL DEFAULT 1.0
);

-- Directed edges; one row per (person, related) pair regardless of kind.
CREATE TABLE IF NOT EXISTS relationships (
    relationship_id   TEXT PRIMARY KEY,
    person_id         TEXT NOT NULL REFERENCES persons(person_id),
    related_person_id TEXT NOT NULL REFERENCES persons(person_id),
    kind              TEXT NOT NULL,
    source            TEXT NOT NULL,     -- 'phone_contacts' | 'extracted' | 'manual'
    created_at        TEXT NOT NULL,
    UNIQUE (person_id, related_person_id)
);

CREATE INDEX IF NOT EXISTS facts_person_idx        ON facts(person_id, is_superseded);
CREATE INDEX IF NOT EXISTS facts_key_idx           ON facts(person_id, category, key);

-- At most one active version per (person, category, key). Writes flip the
-- old row to superseded before inserting, inside the same transaction.
CREATE UNIQUE INDEX IF NOT EXISTS facts_active_key_idx
    ON facts(person_id, category, key COLLATE NOCASE)
    WHERE is_superseded = 0;
CREATE INDEX IF NOT EXISTS mentions_touchpoint_idx ON touchpoint_mentions(touchpoint_id);
CREATE INDEX IF NOT EXISTS touchpoints_primary_idx ON touchpoints(primary_person_id);
CREATE INDEX IF NOT EXISTS relationships_from_idx  ON relationships(person_id);

PRAGMA user_version = 1;
";
