//! Two-phase extraction over a saved touchpoint.
//!
//! Phase one ([`Orchestrator::extract`]) is read-only: it loads the
//! touchpoint, asks the collaborator to label the note, and resolves every
//! mentioned name against the registry into a reviewable draft. Phase two
//! ([`Orchestrator::commit`]) reduces the reviewed draft to a
//! [`CommitPlan`] and applies it through the store in one transaction.
//! Between the phases the draft lives only with the caller.

use std::sync::Arc;

use chrono::Utc;
use rapport_core::{
  commit::{CommitOutcome, CommitPlan, PersonRef, PlannedFact, PlannedRelationship},
  matcher::{MATCH_THRESHOLD, NameMatch, find_matches},
  person::{NewPerson, Person},
  relationship::RelationshipSource,
  staging::{ExtractionDraft, FactEntry, MatchCandidate, MentionEntry},
  store::PersonStore,
  touchpoint::Touchpoint,
};
use uuid::Uuid;

use crate::{
  client::NoteExtractor,
  error::{Error, Result},
  wire::{ExtractionRequest, WireExtraction, WireFact},
};

/// Matches at or above this score bind without review.
pub const AUTO_BIND_SCORE: f64 = 0.85;

/// Drives both extraction phases against a store and a collaborator.
pub struct Orchestrator<S, X> {
  store:     Arc<S>,
  extractor: X,
}

impl<S, X> Orchestrator<S, X>
where
  S: PersonStore,
  X: NoteExtractor,
{
  pub fn new(store: Arc<S>, extractor: X) -> Self {
    Orchestrator { store, extractor }
  }

  /// Phase one: stage a draft for the touchpoint. Writes nothing.
  ///
  /// Fails with [`Error::NoPrimaryPerson`] before any network call when the
  /// touchpoint has no primary person; a collaborator failure surfaces as
  /// [`Error::Transport`] / [`Error::MalformedResponse`] and leaves the
  /// touchpoint exactly as it was.
  pub async fn extract(&self, touchpoint_id: Uuid) -> Result<ExtractionDraft> {
    let (touchpoint, primary) = self.load_primary(touchpoint_id).await?;
    let registry = self
      .store
      .list_persons()
      .await
      .map_err(|err| Error::Store(Box::new(err)))?;

    let request = ExtractionRequest {
      note_text:           touchpoint.raw_note.clone(),
      primary_person_name: primary.display_name(),
      today_date:          Utc::now().date_naive(),
    };
    let reply = self.extractor.extract(&request).await?;

    let draft = stage_draft(reply, &primary, &registry);
    tracing::info!(
      %touchpoint_id,
      mentions = draft.mentions.len(),
      facts = draft.facts.len(),
      "staged extraction draft"
    );
    Ok(draft)
  }

  /// Phase two: apply a reviewed draft atomically.
  pub async fn commit(
    &self,
    touchpoint_id: Uuid,
    draft: &ExtractionDraft,
  ) -> Result<CommitOutcome> {
    let (_, primary) = self.load_primary(touchpoint_id).await?;
    let plan = plan_commit(touchpoint_id, &primary, draft);
    let outcome = self
      .store
      .commit_extraction(plan)
      .await
      .map_err(|err| Error::Commit(Box::new(err)))?;
    tracing::info!(
      %touchpoint_id,
      created_persons = outcome.created_persons.len(),
      facts = outcome.facts.len(),
      "committed extraction"
    );
    Ok(outcome)
  }

  async fn load_primary(&self, touchpoint_id: Uuid) -> Result<(Touchpoint, Person)> {
    let touchpoint = self
      .store
      .get_touchpoint(touchpoint_id)
      .await
      .map_err(|err| Error::Store(Box::new(err)))?
      .ok_or(Error::TouchpointNotFound(touchpoint_id))?;
    let primary_id = touchpoint
      .primary_person_id
      .ok_or(Error::NoPrimaryPerson(touchpoint_id))?;
    let primary = self
      .store
      .get_person(primary_id)
      .await
      .map_err(|err| Error::Store(Box::new(err)))?
      .ok_or(Error::PersonNotFound(primary_id))?;
    Ok((touchpoint, primary))
  }
}

/// Fold a wire reply into a reviewable draft.
///
/// The primary mention binds straight to the primary person. Every other
/// name is scored against the registry: a top match at or above
/// [`AUTO_BIND_SCORE`] binds automatically, anything weaker leaves the
/// mention unbound with its candidates attached for the reviewer. Mentions
/// without a name and facts without a key or value are dropped here.
fn stage_draft(reply: WireExtraction, primary: &Person, registry: &[Person]) -> ExtractionDraft {
  let mut mentions = Vec::with_capacity(reply.mentioned_people.len());
  for mention in reply.mentioned_people {
    let name = mention.name.trim().to_owned();
    if name.is_empty() {
      continue;
    }
    let relationship_to_primary = mention
      .relationship_to_primary
      .filter(|kind| !kind.trim().is_empty());

    if mention.is_primary {
      mentions.push(MentionEntry {
        name,
        relationship_to_primary,
        is_primary: true,
        bound_person: Some(primary.person_id),
        candidates: Vec::new(),
        confirmed: true,
      });
      continue;
    }

    let matches = find_matches(&name, registry, MATCH_THRESHOLD);
    let bound_person = confident_binding(&matches).map(|top| top.person.person_id);
    let candidates = if bound_person.is_some() {
      Vec::new()
    } else {
      matches.iter().map(candidate).collect()
    };
    mentions.push(MentionEntry {
      name,
      relationship_to_primary,
      is_primary: false,
      bound_person,
      candidates,
      confirmed: true,
    });
  }

  let facts: Vec<FactEntry> = reply
    .facts
    .into_iter()
    .map(WireFact::into_entry)
    .filter(|fact| !fact.key.trim().is_empty() && !fact.value.trim().is_empty())
    .collect();

  ExtractionDraft { summary: reply.summary, mentions, facts }
}

/// The top-ranked match, when it clears the auto-bind bar.
pub(crate) fn confident_binding(matches: &[NameMatch]) -> Option<&NameMatch> {
  matches.first().filter(|top| top.score >= AUTO_BIND_SCORE)
}

fn candidate(found: &NameMatch) -> MatchCandidate {
  MatchCandidate {
    person_id:    found.person.person_id,
    display_name: found.person.display_name(),
    score:        found.score,
    kind:         found.kind,
  }
}

/// Reduce a reviewed draft to the plan the store will apply.
///
/// Pure: decides everything about the commit without touching the store.
/// Each distinct unbound name among the confirmed mentions mints exactly
/// one new person, and stated relationships become edges from the primary
/// person to the resolved mention (a mention resolving to the primary
/// themselves never gets a self-edge).
pub fn plan_commit(
  touchpoint_id: Uuid,
  primary: &Person,
  draft: &ExtractionDraft,
) -> CommitPlan {
  let mut plan = CommitPlan::empty(touchpoint_id);
  plan.summary = (!draft.summary.trim().is_empty()).then(|| draft.summary.clone());

  let mut resolved: Vec<(String, PersonRef)> = Vec::new();
  for mention in draft.confirmed_mentions() {
    let reference = match mention.bound_person {
      Some(id) => PersonRef::Existing(id),
      None => match resolved.iter().find(|(name, _)| same_name(name, &mention.name)) {
        Some((_, earlier)) => *earlier,
        None => {
          let minted = PersonRef::Created(plan.new_persons.len());
          plan.new_persons.push(NewPerson::from_display_name(&mention.name));
          minted
        }
      },
    };
    plan.mentions.push(reference);

    if let Some(kind) = &mention.relationship_to_primary {
      let kind = kind.trim();
      if !kind.is_empty() && reference != PersonRef::Existing(primary.person_id) {
        plan.relationships.push(PlannedRelationship {
          person:  PersonRef::Existing(primary.person_id),
          related: reference,
          kind:    kind.to_owned(),
          source:  RelationshipSource::Extracted,
        });
      }
    }
    resolved.push((mention.name.clone(), reference));
  }

  for fact in draft.confirmed_facts() {
    let owner = fact_owner(&fact.person_name, primary, &resolved);
    plan.facts.push(PlannedFact {
      person:            owner,
      category:          fact.category,
      key:               fact.key.clone(),
      value:             fact.value.clone(),
      fact_date:         fact.fact_date,
      is_time_sensitive: fact.is_time_sensitive,
      time_progression:  fact.time_progression,
      confidence:        fact.confidence,
    });
  }

  plan
}

/// Decide which person a staged fact belongs to.
///
/// The primary person claims facts written against their display name or
/// first name; anything else goes to the confirmed mention with the same
/// name. A name matching nothing falls back to the primary person rather
/// than dropping the fact.
fn fact_owner(person_name: &str, primary: &Person, resolved: &[(String, PersonRef)]) -> PersonRef {
  if same_name(person_name, &primary.display_name())
    || same_name(person_name, &primary.first_name)
  {
    return PersonRef::Existing(primary.person_id);
  }
  if let Some((_, reference)) =
    resolved.iter().find(|(name, _)| same_name(name, person_name))
  {
    return *reference;
  }
  tracing::debug!(person_name, "fact owner matched no mention, assigning to primary");
  PersonRef::Existing(primary.person_id)
}

fn same_name(a: &str, b: &str) -> bool {
  a.trim().to_lowercase() == b.trim().to_lowercase()
}
