//! CRMV professional-registry lookup.
//!
//! A separate stage from document extraction with its own error kind. The
//! public search page is queried by registration number. A page counts as a
//! listing when it mentions a professional or a name, or lacks the "no
//! results" marker.

use std::time::Duration;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_REGISTRY_URL: &str =
  "https://www.cfmv.gov.br/busca-por-profissionais/servicos/2018/10/09/";

const NO_RESULTS_MARKER: &str = "nenhum resultado";
const LISTING_MARKERS: [&str; 2] = ["profissional", "nome"];

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
  #[serde(default)]
  pub enabled:      bool,
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_base_url() -> String { DEFAULT_REGISTRY_URL.to_string() }

fn default_timeout_secs() -> u64 { 15 }

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      enabled:      false,
      base_url:     default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

// ─── Result & errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
  Found,
  NotFound,
}

impl RegistryStatus {
  pub fn message(self) -> &'static str {
    match self {
      Self::Found => "CRMV validado com sucesso!",
      Self::NotFound => "CRMV não encontrado. Verifique o número e tente novamente.",
    }
  }
}

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("registration number is blank")]
  MissingNumber,

  #[error("registry request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("registry returned {0}")]
  Status(u16),
}

impl RegistryError {
  pub fn user_message(&self) -> &'static str {
    match self {
      Self::MissingNumber => "Digite o CRMV",
      Self::Http(_) | Self::Status(_) => "Falha ao validar CRMV",
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RegistryClient {
  client:   Client,
  base_url: String,
}

impl RegistryClient {
  pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent("Mozilla/5.0")
      .build()?;
    Ok(Self { client, base_url: config.base_url.clone() })
  }

  /// Look up `crmv` and report whether the registry lists it.
  pub async fn verify(&self, crmv: &str) -> Result<RegistryStatus, RegistryError> {
    let crmv = crmv.trim();
    if crmv.is_empty() {
      return Err(RegistryError::MissingNumber);
    }

    debug!(crmv, "querying professional registry");
    let resp = self
      .client
      .get(&self.base_url)
      .query(&[("crmv", crmv)])
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(RegistryError::Status(resp.status().as_u16()));
    }

    let status = classify(&resp.text().await?);
    info!(crmv, ?status, "registry lookup finished");
    Ok(status)
  }
}

fn classify(body: &str) -> RegistryStatus {
  let body = body.to_lowercase();
  let listed = LISTING_MARKERS.iter().any(|m| body.contains(m))
    || !body.contains(NO_RESULTS_MARKER);
  if listed { RegistryStatus::Found } else { RegistryStatus::NotFound }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;

  fn client_for(server: &mockito::ServerGuard) -> RegistryClient {
    RegistryClient::new(&RegistryConfig {
      enabled:      true,
      base_url:     format!("{}/busca", server.url()),
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[tokio::test]
  async fn listed_number_is_found() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/busca")
      .match_query(Matcher::UrlEncoded("crmv".into(), "SP 12345".into()))
      .with_status(200)
      .with_body("<h2>Profissional</h2><p>Nome: Dra. Ana</p>")
      .create_async()
      .await;

    let status = client_for(&server).verify(" SP 12345 ").await.unwrap();
    assert_eq!(status, RegistryStatus::Found);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn no_results_page_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/busca")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body("<p>Nenhum resultado encontrado</p>")
      .create_async()
      .await;

    let status = client_for(&server).verify("000").await.unwrap();
    assert_eq!(status, RegistryStatus::NotFound);
  }

  #[test]
  fn listing_markers_win_over_no_results() {
    assert_eq!(classify("Nenhum resultado. Nome: Dra. Ana"), RegistryStatus::Found);
    assert_eq!(classify("PROFISSIONAL; nenhum resultado"), RegistryStatus::Found);
    assert_eq!(classify("<p>Nenhum resultado encontrado</p>"), RegistryStatus::NotFound);
    assert_eq!(classify(""), RegistryStatus::Found);
  }

  #[tokio::test]
  async fn server_error_is_a_registry_failure() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/busca")
      .match_query(Matcher::Any)
      .with_status(500)
      .create_async()
      .await;

    let err = client_for(&server).verify("123").await.unwrap_err();
    assert!(matches!(err, RegistryError::Status(500)));
    assert_eq!(err.user_message(), "Falha ao validar CRMV");
  }

  #[tokio::test]
  async fn blank_number_never_hits_the_network() {
    let server = mockito::Server::new_async().await;
    let err = client_for(&server).verify("   ").await.unwrap_err();
    assert!(matches!(err, RegistryError::MissingNumber));
    assert_eq!(err.user_message(), "Digite o CRMV");
  }
}
