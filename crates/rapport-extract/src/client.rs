//! Extraction collaborator: a trait seam plus the hosted LLM implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
  error::{Error, Result},
  wire::{self, ExtractionRequest, WireExtraction},
};

/// Pluggable note-labelling collaborator.
///
/// Production uses [`LlmExtractor`]; tests substitute a scripted
/// implementation that replies from a canned [`WireExtraction`].
#[async_trait]
pub trait NoteExtractor: Send + Sync {
  async fn extract(&self, request: &ExtractionRequest) -> Result<WireExtraction>;
}

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
  /// Base URL up to and including the API version, e.g.
  /// `https://api.openai.com/v1`.
  pub api_endpoint: String,
  pub api_key:      String,
  pub model:        String,
  pub temperature:  f64,
  pub max_tokens:   u32,
}

impl ExtractorConfig {
  pub fn new(
    api_endpoint: impl Into<String>,
    api_key: impl Into<String>,
    model: impl Into<String>,
  ) -> Self {
    Self {
      api_endpoint: api_endpoint.into(),
      api_key:      api_key.into(),
      model:        model.into(),
      temperature:  0.1,
      max_tokens:   1500,
    }
  }
}

/// [`NoteExtractor`] backed by a hosted chat-completions model.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct LlmExtractor {
  client: reqwest::Client,
  config: ExtractorConfig,
}

impl LlmExtractor {
  pub fn new(config: ExtractorConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self { client, config })
  }

  fn user_prompt(request: &ExtractionRequest) -> String {
    format!(
      "The note below records an interaction with {primary}. Today's date \
       is {today}.\n\nNote:\n---\n{note}\n---",
      primary = request.primary_person_name,
      today = request.today_date,
      note = request.note_text,
    )
  }
}

const SYSTEM_PROMPT: &str = r#"You label people and durable facts in a short personal note.

Reply with ONLY a JSON object, no explanation and no code fences, shaped exactly like:
{
  "summary": "one or two sentences describing the interaction",
  "mentioned_people": [
    {"name": "Sara Kim", "relationship_to_primary": "sister", "is_primary": false}
  ],
  "facts": [
    {"person_name": "Sara Kim", "category": "work", "key": "employer",
     "value": "Acme Corp", "fact_date": "2025-03-01", "is_time_sensitive": false,
     "time_progression": "none", "confidence": 0.9}
  ]
}

Rules:
- Include the primary person in mentioned_people with is_primary = true.
- relationship_to_primary is the relation as stated in the note ("sister",
  "coworker"), or null when the note does not say.
- category is one of: work, education, family, health, interest, location,
  milestone, preference, general.
- key is a short snake_case attribute name such as employer, age, city.
- Mark a fact time-sensitive only when its value drifts with the calendar
  (an age, a study year, a job tenure); then set fact_date to the date the
  value was true and time_progression to age, academic_year, or tenure.
  Everything else gets is_time_sensitive = false and time_progression "none".
- confidence is your certainty in the fact, between 0 and 1."#;

#[async_trait]
impl NoteExtractor for LlmExtractor {
  async fn extract(&self, request: &ExtractionRequest) -> Result<WireExtraction> {
    let body = serde_json::json!({
      "model": self.config.model,
      "messages": [
        { "role": "system", "content": SYSTEM_PROMPT },
        { "role": "user", "content": Self::user_prompt(request) },
      ],
      "temperature": self.config.temperature,
      "max_tokens": self.config.max_tokens,
    });

    tracing::debug!(model = %self.config.model, "requesting note extraction");

    let response = self
      .client
      .post(format!("{}/chat/completions", self.config.api_endpoint))
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      tracing::warn!(%status, "extraction request rejected");
      return Err(Error::Api { status, body });
    }

    let completion: ChatCompletion = response
      .json()
      .await
      .map_err(|err| Error::MalformedResponse(err.to_string()))?;
    let content = completion
      .choices
      .first()
      .map(|choice| choice.message.content.as_str())
      .ok_or_else(|| Error::MalformedResponse("completion has no choices".into()))?;

    wire::decode_extraction(content)
  }
}

// Just enough of the chat-completions reply to reach the content string.

#[derive(Debug, Deserialize)]
struct ChatCompletion {
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
  content: String,
}
