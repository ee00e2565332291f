//! Core domain types for rapport: people, touchpoints, the append-only
//! fact ledger, relationship edges, and the [`store::PersonStore`] trait
//! that storage backends implement.
//!
//! Everything here is plain data plus pure functions. Persistence lives in
//! `rapport-store-sqlite`; extraction against a language model lives in
//! `rapport-extract`.

pub mod commit;
pub mod error;
pub mod fact;
pub mod matcher;
pub mod person;
pub mod relationship;
pub mod staging;
pub mod store;
pub mod temporal;
pub mod touchpoint;

pub use error::{Error, Result};
