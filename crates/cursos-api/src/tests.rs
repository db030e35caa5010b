//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{
  collections::VecDeque,
  future::Future,
  sync::{Arc, Mutex},
};

use axum::{
  Router,
  body::Body,
  http::{HeaderName, Request, StatusCode, header},
};
use cursos_capture::{
  error::EXTRACTION_FAILED,
  model::{DocumentModel, InlineImage},
};
use cursos_core::{event::OriginPolicy, validation::NAME_REQUIRED};
use cursos_store_sqlite::SqlitePreferenceStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, SessionRegistry, api_router};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("model unavailable")]
struct FakeError;

#[derive(Default)]
struct FakeModel {
  replies: Mutex<VecDeque<String>>,
}

impl FakeModel {
  fn replying(replies: &[&str]) -> Self {
    Self { replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()) }
  }
}

impl DocumentModel for FakeModel {
  type Error = FakeError;

  fn name(&self) -> &str { "fake" }

  fn generate<'a>(
    &'a self,
    _prompt: &'a str,
    _image: &'a InlineImage,
  ) -> impl Future<Output = Result<String, FakeError>> + Send + 'a {
    let reply = self.replies.lock().unwrap().pop_front();
    async move { reply.ok_or(FakeError) }
  }
}

const CNH_REPLY: &str = "```json\n{\"tipo_documento\":\"CNH\",\"nome_completo\":\"JOAO PEREIRA\",\"cpf\":\"987.654.321-00\",\"data_nascimento\":\"10/10/1985\",\"nome_mae\":\"ANA PEREIRA\",\"numero_registro\":\"01234567890\"}\n```";

type State = AppState<FakeModel, SqlitePreferenceStore>;

async fn make_state(model: FakeModel) -> State {
  let prefs = SqlitePreferenceStore::open_in_memory().await.unwrap();
  AppState::new(SessionRegistry::new(Arc::new(model)), Arc::new(prefs))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  headers: Vec<(HeaderName, &str)>,
  body: impl Into<Body>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = builder.body(body.into()).unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
  send(
    app,
    method,
    uri,
    vec![(header::CONTENT_TYPE, "application/json")],
    body.to_string(),
  )
  .await
}

async fn new_session(app: &Router) -> String {
  let (status, body) = send(app, "POST", "/sessions", vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::CREATED);
  body["session_id"].as_str().unwrap().to_string()
}

async fn save_contact(app: &Router, id: &str) -> (StatusCode, Value) {
  send_json(
    app,
    "PUT",
    &format!("/sessions/{id}/contact"),
    json!({ "name": "Jane Doe", "email": "jane@example.com", "phone": "11 99999-0000" }),
  )
  .await
}

async fn upload(app: &Router, id: &str, media_type: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
  send(
    app,
    "PUT",
    &format!("/sessions/{id}/document/image"),
    vec![(header::CONTENT_TYPE, media_type)],
    bytes,
  )
  .await
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_session_is_404() {
  let app = api_router(make_state(FakeModel::default()).await);
  let uri = format!("/sessions/{}/profile", uuid::Uuid::new_v4());
  let (status, body) = send(&app, "GET", &uri, vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("session"));
}

#[tokio::test]
async fn session_limit_returns_503() {
  let prefs = SqlitePreferenceStore::open_in_memory().await.unwrap();
  let sessions = SessionRegistry::new(Arc::new(FakeModel::default())).with_max_sessions(1);
  let app = api_router(AppState::new(sessions, Arc::new(prefs)));

  new_session(&app).await;
  let (status, _) = send(&app, "POST", "/sessions", vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn deleted_session_is_gone() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;

  let (status, _) = send(&app, "DELETE", &format!("/sessions/{id}"), vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) =
    send(&app, "GET", &format!("/sessions/{id}/profile"), vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Contact form ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn capture_opens_edit_then_view() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  let capture = format!("/sessions/{id}/capture");

  let (status, body) = send(&app, "POST", &capture, vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "edit");

  let (status, body) = save_contact(&app, &id).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["next"], "open_document_modal");
  assert_eq!(body["profile"]["name"], "Jane Doe");

  let (_, body) = send(&app, "POST", &capture, vec![], Body::empty()).await;
  assert_eq!(body["mode"], "view");
}

#[tokio::test]
async fn invalid_contact_is_422_with_fields() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;

  let (status, body) = send_json(
    &app,
    "PUT",
    &format!("/sessions/{id}/contact"),
    json!({ "name": "  ", "email": "a@b.co", "phone": "1" }),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["fields"]["name"], NAME_REQUIRED);
  assert!(body["fields"].get("email").is_none());

  let (_, body) =
    send(&app, "GET", &format!("/sessions/{id}/profile"), vec![], Body::empty()).await;
  assert_eq!(body["profile"]["name"], "");
  assert_eq!(body["modals"]["document_modal_open"], false);
}

// ─── Document modal ───────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_requires_open_modal() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  let (status, _) = upload(&app, &id, "image/png", vec![1, 2, 3]).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn contact_then_document_fills_profile() {
  let app = api_router(make_state(FakeModel::replying(&[CNH_REPLY])).await);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;

  let (status, body) = send(
    &app,
    "PUT",
    &format!("/sessions/{id}/document/image"),
    vec![
      (header::CONTENT_TYPE, "image/jpeg"),
      (HeaderName::from_static("x-file-name"), "cnh.jpg"),
    ],
    vec![0xFF, 0xD8, 0xFF],
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["size"], 3);
  assert_eq!(body["file_name"], "cnh.jpg");

  let (status, body) =
    send(&app, "POST", &format!("/sessions/{id}/document/extract"), vec![], Body::empty())
      .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["result"]["tipo_documento"], "CNH");

  let profile = &body["profile"];
  assert_eq!(profile["name"], "Jane Doe");
  assert_eq!(profile["document_holder_name"], "JOAO PEREIRA");
  assert_eq!(profile["tax_id"], "987.654.321-00");
  assert_eq!(profile["mother_name"], "ANA PEREIRA");

  let (_, view) =
    send(&app, "GET", &format!("/sessions/{id}/document"), vec![], Body::empty()).await;
  assert_eq!(view["phase"], "extracted");
  assert_eq!(view["modal_open"], true);
}

#[tokio::test]
async fn non_image_upload_is_415() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;

  let (status, body) = upload(&app, &id, "application/pdf", b"%PDF".to_vec()).await;
  assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
  assert_eq!(body["error"], "Por favor, selecione um arquivo de imagem válido.");
}

#[tokio::test]
async fn oversized_upload_is_413() {
  let state = make_state(FakeModel::default()).await.with_max_image_bytes(8);
  let app = api_router(state);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;

  let (status, _) = upload(&app, &id, "image/png", vec![0; 64]).await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn extract_without_image_is_204() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;

  let (status, _) =
    send(&app, "POST", &format!("/sessions/{id}/document/extract"), vec![], Body::empty())
      .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn model_failure_is_502_with_generic_message() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;
  upload(&app, &id, "image/jpeg", vec![1]).await;

  let (status, body) =
    send(&app, "POST", &format!("/sessions/{id}/document/extract"), vec![], Body::empty())
      .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["error"], EXTRACTION_FAILED);

  let (_, view) =
    send(&app, "GET", &format!("/sessions/{id}/document"), vec![], Body::empty()).await;
  assert_eq!(view["phase"], "error");
  assert_eq!(view["error"], EXTRACTION_FAILED);

  let (_, body) =
    send(&app, "GET", &format!("/sessions/{id}/profile"), vec![], Body::empty()).await;
  assert_eq!(body["profile"]["tax_id"], Value::Null);
}

#[tokio::test]
async fn reset_clears_the_document() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  save_contact(&app, &id).await;
  upload(&app, &id, "image/jpeg", vec![1]).await;

  let (status, _) =
    send(&app, "DELETE", &format!("/sessions/{id}/document"), vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, view) =
    send(&app, "GET", &format!("/sessions/{id}/document"), vec![], Body::empty()).await;
  assert_eq!(view["phase"], "idle");
  assert_eq!(view["image"], Value::Null);
}

// ─── Widget events ────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_modal_event_seeds_contact() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;

  let (status, body) = send_json(
    &app,
    "POST",
    &format!("/sessions/{id}/events"),
    json!({ "type": "OPEN_MODAL", "userData": { "name": "Ana", "email": "ana@vet.br", "phone": "" } }),
  )
  .await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(body["handled"], true);

  let (_, body) =
    send(&app, "GET", &format!("/sessions/{id}/profile"), vec![], Body::empty()).await;
  assert_eq!(body["profile"]["name"], "Ana");
  assert_eq!(body["profile"]["phone"], "");
  assert_eq!(body["modals"]["document_modal_open"], true);
}

#[tokio::test]
async fn unknown_or_malformed_events_are_ignored() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  let uri = format!("/sessions/{id}/events");

  let (status, body) = send_json(&app, "POST", &uri, json!({ "type": "PING" })).await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(body["handled"], false);

  let (status, body) = send(&app, "POST", &uri, vec![], "not json").await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(body["handled"], false);
}

#[tokio::test]
async fn events_from_other_origins_are_ignored() {
  let state = make_state(FakeModel::default())
    .await
    .with_origins(OriginPolicy::new(["https://typebot.io"]));
  let app = api_router(state);
  let id = new_session(&app).await;
  let uri = format!("/sessions/{id}/events");
  let open = json!({ "type": "OPEN_MODAL" }).to_string();

  let (_, body) = send(
    &app,
    "POST",
    &uri,
    vec![(header::ORIGIN, "https://evil.example")],
    open.clone(),
  )
  .await;
  assert_eq!(body["handled"], false);

  let (_, body) =
    send(&app, "POST", &uri, vec![(header::ORIGIN, "https://typebot.io")], open).await;
  assert_eq!(body["handled"], true);
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registry_lookup_is_404_when_disabled() {
  let app = api_router(make_state(FakeModel::default()).await);
  let id = new_session(&app).await;
  let (status, body) = send_json(
    &app,
    "POST",
    &format!("/sessions/{id}/registration"),
    json!({ "crmv": "SP 1234" }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("disabled"));
}

// ─── Preferences ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn display_mode_defaults_and_persists() {
  let app = api_router(make_state(FakeModel::default()).await);

  let (status, body) =
    send(&app, "GET", "/preferences/display-mode", vec![], Body::empty()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "light");

  let (status, _) =
    send_json(&app, "PUT", "/preferences/display-mode", json!({ "mode": "dark" })).await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = send(&app, "GET", "/preferences/display-mode", vec![], Body::empty()).await;
  assert_eq!(body["mode"], "dark");
}

#[tokio::test]
async fn unknown_display_mode_is_rejected() {
  let app = api_router(make_state(FakeModel::default()).await);
  let (status, _) =
    send_json(&app, "PUT", "/preferences/display-mode", json!({ "mode": "sepia" })).await;
  assert!(status.is_client_error());
}
