//! Note extraction pipeline: turn a saved touchpoint's raw text into staged
//! people, relationship, and fact changes, then apply a reviewed draft.
//!
//! The pipeline has two phases. [`Orchestrator::extract`] (phase one) reads
//! the touchpoint, asks a [`NoteExtractor`] collaborator to label the note,
//! resolves mentioned names against the person registry, and returns an
//! [`ExtractionDraft`](rapport_core::staging::ExtractionDraft) without
//! writing anything. [`Orchestrator::commit`] (phase two) turns the possibly
//! edited draft into a [`CommitPlan`](rapport_core::commit::CommitPlan) and
//! hands it to the store as one atomic operation. A draft that is never
//! committed costs nothing.

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod wire;

pub use client::{ExtractorConfig, LlmExtractor, NoteExtractor};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, plan_commit};
