use std::sync::Arc;

use async_trait::async_trait;
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use rapport_core::{person::NewPerson, store::PersonStore};
use rapport_extract::{
  client::NoteExtractor,
  wire::{ExtractionRequest, WireExtraction, WireFact, WireMention},
};
use rapport_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

// ── Harness ─────────────────────────────────────────────────────────────────

/// Replies with a canned extraction no matter the request.
struct Scripted(WireExtraction);

#[async_trait]
impl NoteExtractor for Scripted {
  async fn extract(
    &self,
    _request: &ExtractionRequest,
  ) -> rapport_extract::Result<WireExtraction> {
    Ok(self.0.clone())
  }
}

fn silent_extractor() -> Scripted {
  Scripted(WireExtraction::default())
}

async fn app() -> (Router, Arc<SqliteStore>) {
  app_with(silent_extractor()).await
}

async fn app_with(extractor: impl NoteExtractor + 'static) -> (Router, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let router = api_router(Arc::clone(&store), extractor);
  (router, store)
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn seed_person(store: &SqliteStore, first: &str, last: &str) -> Uuid {
  store
    .add_person(NewPerson::app_local(first, last))
    .await
    .unwrap()
    .person_id
}

async fn seed_touchpoint(app: &Router, primary: Uuid, note: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/touchpoints",
    Some(json!({ "primary_person_id": primary, "raw_note": note })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["touchpoint_id"].as_str().unwrap().to_owned()
}

// ── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn person_round_trip() {
  let (app, _store) = app().await;

  let (status, created) = send(
    &app,
    "POST",
    "/persons",
    Some(json!({ "first_name": "Maya", "last_name": "Chen" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["source"], "app_local");
  let id = created["person_id"].as_str().unwrap();

  let (status, fetched) = send(&app, "GET", &format!("/persons/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["first_name"], "Maya");
  assert_eq!(fetched["last_name"], "Chen");

  let (status, listed) = send(&app, "GET", "/persons", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn phone_contact_without_contact_id_is_rejected() {
  let (app, _store) = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/persons",
    Some(json!({ "first_name": "Ana", "source": "phone_contact" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("external_contact_id"));
}

#[tokio::test]
async fn unknown_person_returns_404() {
  let (app, _store) = app().await;
  let (status, body) =
    send(&app, "GET", &format!("/persons/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

// ── Touchpoints ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn touchpoint_round_trip() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;

  let id = seed_touchpoint(&app, maya, "Coffee downtown.").await;

  let (status, fetched) = send(&app, "GET", &format!("/touchpoints/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["raw_note"], "Coffee downtown.");
  assert_eq!(fetched["interaction_type"], "conversation");
  assert_eq!(fetched["summary"], Value::Null);

  let (status, listed) =
    send(&app, "GET", &format!("/touchpoints?person_id={maya}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn touchpoint_with_unknown_primary_is_rejected() {
  let (app, _store) = app().await;
  let (status, _) = send(
    &app,
    "POST",
    "/touchpoints",
    Some(json!({ "primary_person_id": Uuid::new_v4(), "raw_note": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Facts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fact_list_re_derives_time_sensitive_values() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;

  let (status, _) = send(
    &app,
    "POST",
    "/facts",
    Some(json!({
      "person_id": maya,
      "category": "education",
      "key": "academic_year",
      "value": "2nd year Biology",
      "fact_date": "2023-09-01",
      "is_time_sensitive": true,
      "time_progression": "academic_year",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, listed) = send(
    &app,
    "GET",
    &format!("/facts?person_id={maya}&as_of=2025-10-01"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let facts = listed.as_array().unwrap();
  assert_eq!(facts.len(), 1);
  // The stored baseline stays as captured; only the view advances.
  assert_eq!(facts[0]["value"], "2nd year Biology");
  assert_eq!(facts[0]["current_value"], "4th year Biology");

  let (_, earlier) = send(
    &app,
    "GET",
    &format!("/facts?person_id={maya}&as_of=2024-01-01"),
    None,
  )
  .await;
  assert_eq!(earlier[0]["current_value"], "2nd year Biology");
}

#[tokio::test]
async fn fact_supersession_over_the_api() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;

  let (status, first) = send(
    &app,
    "POST",
    "/facts",
    Some(json!({
      "person_id": maya,
      "category": "work",
      "key": "employer",
      "value": "Acme Corp",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["superseded"], Value::Null);
  let first_id = first["fact"]["fact_id"].as_str().unwrap().to_owned();

  // Same key with different casing still supersedes.
  let (status, second) = send(
    &app,
    "POST",
    "/facts",
    Some(json!({
      "person_id": maya,
      "category": "work",
      "key": "Employer",
      "value": "Globex",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(second["superseded"], Value::String(first_id));

  let (_, active) = send(&app, "GET", &format!("/facts?person_id={maya}"), None).await;
  assert_eq!(active.as_array().unwrap().len(), 1);
  assert_eq!(active[0]["value"], "Globex");

  let (_, all) = send(
    &app,
    "GET",
    &format!("/facts?person_id={maya}&include_superseded=true"),
    None,
  )
  .await;
  assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn fact_history_lists_versions_newest_first() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;

  for value in ["Acme Corp", "Globex"] {
    let (status, _) = send(
      &app,
      "POST",
      "/facts",
      Some(json!({
        "person_id": maya,
        "category": "work",
        "key": "employer",
        "value": value,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, active) = send(&app, "GET", &format!("/facts?person_id={maya}"), None).await;
  let latest_id = active[0]["fact_id"].as_str().unwrap();

  let (status, history) =
    send(&app, "GET", &format!("/facts/{latest_id}/history"), None).await;
  assert_eq!(status, StatusCode::OK);
  let versions = history.as_array().unwrap();
  assert_eq!(versions.len(), 2);
  assert_eq!(versions[0]["value"], "Globex");
  assert_eq!(versions[1]["value"], "Acme Corp");
  assert_eq!(versions[1]["is_superseded"], true);
}

// ── Relationships ───────────────────────────────────────────────────────────

#[tokio::test]
async fn relationship_create_then_skip() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;
  let sarah = seed_person(&store, "Sarah", "Kim").await;

  let body = json!({
    "person_id": maya,
    "related_person_id": sarah,
    "kind": "sister",
  });
  let (status, created) = send(&app, "POST", "/relationships", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["outcome"], "created");

  // Replaying the pair keeps the stored kind.
  let (status, skipped) = send(
    &app,
    "POST",
    "/relationships",
    Some(json!({
      "person_id": maya,
      "related_person_id": sarah,
      "kind": "friend",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(skipped["outcome"], "skipped");
  assert_eq!(skipped["relationship"]["kind"], "sister");

  let (_, listed) = send(
    &app,
    "GET",
    &format!("/persons/{maya}/relationships"),
    None,
  )
  .await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn self_relationship_is_rejected() {
  let (app, store) = app().await;
  let maya = seed_person(&store, "Maya", "Chen").await;
  let (status, _) = send(
    &app,
    "POST",
    "/relationships",
    Some(json!({
      "person_id": maya,
      "related_person_id": maya,
      "kind": "twin",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Extraction ──────────────────────────────────────────────────────────────

fn coffee_reply() -> WireExtraction {
  WireExtraction {
    summary:          "Caught up over coffee.".into(),
    mentioned_people: vec![
      WireMention {
        name: "Maya Chen".into(),
        relationship_to_primary: None,
        is_primary: true,
      },
      WireMention {
        name: "Tom Becker".into(),
        relationship_to_primary: Some("brother".into()),
        is_primary: false,
      },
    ],
    facts:            vec![WireFact {
      person_name: "Tom Becker".into(),
      category: "location".into(),
      key: "city".into(),
      value: "Lisbon".into(),
      fact_date: None,
      is_time_sensitive: false,
      time_progression: None,
      confidence: 0.9,
    }],
  }
}

#[tokio::test]
async fn extract_returns_a_draft_and_writes_nothing() {
  let (app, store) = app_with(Scripted(coffee_reply())).await;
  let maya = seed_person(&store, "Maya", "Chen").await;
  let id = seed_touchpoint(&app, maya, "Coffee with Tom.").await;

  let (status, draft) = send(
    &app,
    "POST",
    &format!("/touchpoints/{id}/extract"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(draft["summary"], "Caught up over coffee.");
  let mentions = draft["mentions"].as_array().unwrap();
  assert_eq!(mentions.len(), 2);
  assert_eq!(mentions[1]["bound_person"], Value::Null);
  assert_eq!(mentions[1]["confirmed"], true);

  // Phase one must leave the touchpoint untouched.
  let (_, touchpoint) = send(&app, "GET", &format!("/touchpoints/{id}"), None).await;
  assert_eq!(touchpoint["summary"], Value::Null);
  assert!(touchpoint["mentioned_people"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn commit_applies_the_reviewed_draft() {
  let (app, store) = app_with(Scripted(coffee_reply())).await;
  let maya = seed_person(&store, "Maya", "Chen").await;
  let id = seed_touchpoint(&app, maya, "Coffee with Tom.").await;

  let (_, draft) = send(
    &app,
    "POST",
    &format!("/touchpoints/{id}/extract"),
    None,
  )
  .await;

  let (status, outcome) = send(
    &app,
    "POST",
    &format!("/touchpoints/{id}/commit"),
    Some(draft),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["summary_updated"], true);
  assert_eq!(outcome["created_persons"][0]["first_name"], "Tom");
  let tom = outcome["created_persons"][0]["person_id"].as_str().unwrap();

  let (_, touchpoint) = send(&app, "GET", &format!("/touchpoints/{id}"), None).await;
  assert_eq!(touchpoint["summary"], "Caught up over coffee.");

  let (_, facts) = send(&app, "GET", &format!("/facts?person_id={tom}"), None).await;
  assert_eq!(facts[0]["value"], "Lisbon");

  let (_, edges) = send(
    &app,
    "GET",
    &format!("/persons/{maya}/relationships"),
    None,
  )
  .await;
  assert_eq!(edges[0]["related_person_id"], tom);
  assert_eq!(edges[0]["kind"], "brother");
  assert_eq!(edges[0]["source"], "extracted");
}

#[tokio::test]
async fn extract_without_primary_person_is_rejected() {
  let (app, _store) = app_with(Scripted(coffee_reply())).await;
  let (status, created) = send(
    &app,
    "POST",
    "/touchpoints",
    Some(json!({ "raw_note": "unfiled note" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = created["touchpoint_id"].as_str().unwrap();

  let (status, body) = send(
    &app,
    "POST",
    &format!("/touchpoints/{id}/extract"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("primary"));
}

#[tokio::test]
async fn extract_on_unknown_touchpoint_returns_404() {
  let (app, _store) = app().await;
  let (status, _) = send(
    &app,
    "POST",
    &format!("/touchpoints/{}/extract", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
