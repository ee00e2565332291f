//! SQLite backend for the rapport person store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That single connection also serializes
//! every extraction commit: read-check-write sequences run inside one SQL
//! transaction on one thread, so concurrent commits cannot interleave.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
