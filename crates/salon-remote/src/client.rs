//! Async HTTP client wrapping the hosted database's REST and auth endpoints.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use salon_core::{
  Record, RecordId,
  actor::{Actor, ActorProvider},
  record::ID_FIELD,
  remote::{OrderBy, RemoteError, RemoteStore},
  valid_table_name,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, classify};

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the hosted database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
  /// Project URL, e.g. `https://abc.supabase.co`.
  pub base_url:     String,
  /// Public API key sent as `apikey` on every request.
  pub api_key:      String,
  /// Session token of the signed-in user. Without one, requests are made
  /// with the API key alone and no actor is available.
  #[serde(default)]
  pub access_token: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Async HTTP client for the hosted database.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RemoteClient {
  client: Client,
  config: RemoteConfig,
}

impl RemoteClient {
  pub fn new(config: RemoteConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &RemoteConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `table` goes into the URL path unescaped, so anything but an identifier
  /// is refused before a request is built.
  fn table_url(&self, table: &str) -> Result<String, RemoteError> {
    if !valid_table_name(table) {
      return Err(RemoteError::other(format!("invalid table name {table:?}")));
    }
    Ok(self.url(&format!("/rest/v1/{table}")))
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    let bearer = self
      .config
      .access_token
      .as_deref()
      .unwrap_or(&self.config.api_key);
    req.header("apikey", &self.config.api_key).bearer_auth(bearer)
  }

  /// Send `req`, turning transport failures and non-success statuses into
  /// [`RemoteError`]s.
  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
    let resp = self
      .auth(req)
      .send()
      .await
      .map_err(|e| RemoteError::other(format!("{what} failed: {e}")))?;

    if resp.status().is_success() {
      return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let err = classify::from_response(status, &body);
    debug!(%status, class = ?err.class, code = ?err.code, "{what} rejected");
    Err(err)
  }

  async fn rows(resp: Response, what: &str) -> Result<Vec<Record>, RemoteError> {
    resp
      .json()
      .await
      .map_err(|e| RemoteError::other(format!("deserialising {what} response: {e}")))
  }
}

fn id_filter(id: &RecordId) -> [(&'static str, String); 1] { [(ID_FIELD, format!("eq.{id}"))] }

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for RemoteClient {
  /// `GET /rest/v1/{table}?select=*[&order=<col>.desc]`
  async fn select(&self, table: &str, order: Option<&OrderBy>) -> Result<Vec<Record>, RemoteError> {
    let mut query = vec![("select", "*".to_owned())];
    if let Some(order) = order {
      let dir = if order.descending { "desc" } else { "asc" };
      query.push(("order", format!("{}.{dir}", order.column)));
    }

    let what = format!("GET {table}");
    let resp = self
      .send(self.client.get(self.table_url(table)?).query(&query), &what)
      .await?;
    Self::rows(resp, &what).await
  }

  /// `POST /rest/v1/{table}` with `Prefer: return=representation`
  async fn insert(&self, table: &str, record: &Record) -> Result<Record, RemoteError> {
    let what = format!("POST {table}");
    let req = self
      .client
      .post(self.table_url(table)?)
      .header("Prefer", "return=representation")
      .json(record);
    let resp = self.send(req, &what).await?;
    Self::rows(resp, &what)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| RemoteError::other(format!("{what} returned no rows")))
  }

  /// `PATCH /rest/v1/{table}?id=eq.{id}` with `Prefer: return=representation`
  async fn update(
    &self,
    table: &str,
    id: &RecordId,
    fields: &Record,
  ) -> Result<Option<Record>, RemoteError> {
    let what = format!("PATCH {table}/{id}");
    let req = self
      .client
      .patch(self.table_url(table)?)
      .query(&id_filter(id))
      .header("Prefer", "return=representation")
      .json(fields);
    let resp = self.send(req, &what).await?;
    Ok(Self::rows(resp, &what).await?.into_iter().next())
  }

  /// `DELETE /rest/v1/{table}?id=eq.{id}`
  async fn delete(&self, table: &str, id: &RecordId) -> Result<(), RemoteError> {
    let what = format!("DELETE {table}/{id}");
    let req = self.client.delete(self.table_url(table)?).query(&id_filter(id));
    self.send(req, &what).await?;
    Ok(())
  }
}

// ─── ActorProvider impl ──────────────────────────────────────────────────────

impl ActorProvider for RemoteClient {
  /// `GET /auth/v1/user` with the session token. `None` without a token or
  /// when the session is rejected.
  async fn current_actor(&self) -> Option<Actor> {
    let token = self.config.access_token.as_deref()?;

    let resp = self
      .client
      .get(self.url("/auth/v1/user"))
      .header("apikey", &self.config.api_key)
      .bearer_auth(token)
      .send()
      .await
      .inspect_err(|e| debug!(error = %e, "session lookup failed"))
      .ok()?;

    if !resp.status().is_success() {
      debug!(status = %resp.status(), "no authenticated session");
      return None;
    }
    resp
      .json::<Actor>()
      .await
      .inspect_err(|e| debug!(error = %e, "unreadable session payload"))
      .ok()
  }
}
