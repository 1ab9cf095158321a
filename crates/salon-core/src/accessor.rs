//! The resilient table accessor.
//!
//! A [`TableHandle`] reads and writes one logical table through a
//! [`RemoteStore`], and falls back to a [`LocalStore`] when the remote schema
//! is missing the table or a column. Each handle keeps an in-memory cached
//! view of the table that always mirrors whichever layer answered last.
//!
//! Per-handle state machine:
//!
//! ```text
//! Uninitialized ──list──▶ Loading ──ok──▶ RemoteActive
//!                                  └─err─▶ FallbackActive
//! ```
//!
//! Entering `FallbackActive` is sticky: writes go to the local store until a
//! later `list` succeeds remotely.

use std::{
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::ActorProvider,
  config::AccessorConfig,
  local::LocalStore,
  record::{CREATED_AT_FIELD, ID_FIELD, Record, RecordId},
  remote::{ErrorClass, OrderBy, RemoteError, RemoteStore},
  schema_error::mentions_field,
};

// ─── Accessor ────────────────────────────────────────────────────────────────

/// Table names end up in remote URL paths and on-device keys, so only
/// identifier characters are accepted.
pub fn valid_table_name(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Shared backends and configuration from which table handles are created.
///
/// Cloning is cheap; every component is reference-counted.
pub struct Accessor<R, L, A> {
  remote: Arc<R>,
  local:  Arc<L>,
  actor:  Arc<A>,
  config: Arc<AccessorConfig>,
}

impl<R, L, A> Clone for Accessor<R, L, A> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      local:  Arc::clone(&self.local),
      actor:  Arc::clone(&self.actor),
      config: Arc::clone(&self.config),
    }
  }
}

impl<R, L, A> Accessor<R, L, A>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  pub fn new(remote: R, local: L, actor: A, config: AccessorConfig) -> Self {
    Self::from_shared(Arc::new(remote), Arc::new(local), Arc::new(actor), config)
  }

  /// Build from already-shared backends, e.g. when one client is both the
  /// remote store and the actor provider.
  pub fn from_shared(remote: Arc<R>, local: Arc<L>, actor: Arc<A>, config: AccessorConfig) -> Self {
    Self { remote, local, actor, config: Arc::new(config) }
  }

  pub fn config(&self) -> &AccessorConfig { &self.config }

  pub fn remote(&self) -> &R { &self.remote }

  pub fn local(&self) -> &L { &self.local }

  /// Create a fresh handle for `name` with an empty cached view.
  pub fn table(&self, name: impl Into<String>) -> TableHandle<R, L, A> {
    let name = name.into();
    TableHandle {
      key:      self.config.storage_key(&name),
      name,
      accessor: self.clone(),
      state:    Mutex::new(TableState::default()),
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Lifecycle phase of a table handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Uninitialized,
  Loading,
  RemoteActive,
  FallbackActive,
}

/// Point-in-time snapshot of a handle, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatus {
  pub table:      String,
  pub phase:      Phase,
  pub fallback:   bool,
  /// Number of records in the cached view.
  pub cached:     usize,
  /// Message of the remote failure that caused the last fallback.
  pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct TableState {
  phase:      Phase,
  fallback:   bool,
  view:       Vec<Record>,
  last_error: Option<String>,
}

// ─── TableHandle ─────────────────────────────────────────────────────────────

/// List/insert/update/remove against one logical table.
///
/// Operations are independent: concurrent calls are not serialised, and the
/// cached view reflects whichever response completes last.
pub struct TableHandle<R, L, A> {
  name:     String,
  key:      String,
  accessor: Accessor<R, L, A>,
  state:    Mutex<TableState>,
}

impl<R, L, A> TableHandle<R, L, A>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  pub fn name(&self) -> &str { &self.name }

  /// Key of this table's list in the on-device store.
  pub fn storage_key(&self) -> &str { &self.key }

  pub fn view(&self) -> Vec<Record> { self.state().view.clone() }

  pub fn find(&self, id: &RecordId) -> Option<Record> {
    self.state().view.iter().find(|r| r.has_id(id)).cloned()
  }

  pub fn is_fallback(&self) -> bool { self.state().fallback }

  pub fn phase(&self) -> Phase { self.state().phase }

  pub fn status(&self) -> TableStatus {
    let state = self.state();
    TableStatus {
      table:      self.name.clone(),
      phase:      state.phase,
      fallback:   state.fallback,
      cached:     state.view.len(),
      last_error: state.last_error.clone(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Load the table, newest first. Never fails: remote errors degrade to the
  /// on-device copy, and an unreadable on-device copy degrades to nothing.
  pub async fn list(&self) -> Vec<Record> {
    self.with_state(|s| s.phase = Phase::Loading);

    let order = OrderBy::desc(self.config().order_field.as_str());
    let result = match self.remote().select(&self.name, Some(&order)).await {
      Err(err) if err.is_undefined_column() => {
        debug!(table = %self.name, error = %err, "ordering column missing; retrying unordered");
        self.remote().select(&self.name, None).await
      }
      other => other,
    };

    match result {
      Ok(rows) => {
        self.with_state(|s| {
          s.phase = Phase::RemoteActive;
          s.fallback = false;
          s.last_error = None;
          s.view = rows.clone();
        });
        rows
      }
      Err(err) => {
        if err.is_undefined_table() {
          info!(table = %self.name, "remote table missing; reading on-device storage");
        } else {
          warn!(table = %self.name, error = %err, "remote read failed; reading on-device storage");
        }
        let rows = self.read_local().await.unwrap_or_else(|e| {
          error!(table = %self.name, error = %e, "on-device storage unreadable");
          Vec::new()
        });
        self.with_state(|s| {
          s.phase = Phase::FallbackActive;
          s.fallback = true;
          s.last_error = Some(err.to_string());
          s.view = rows.clone();
        });
        rows
      }
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Insert a record built from `fields`, stamped with the current actor.
  ///
  /// Only fails when the on-device store is unusable, or when a generic
  /// remote failure occurs while `fallback_on_write_error` is off.
  pub async fn insert(&self, fields: Record) -> Result<Record> {
    let mut candidate = fields;
    if let Some(actor) = self.accessor.actor.current_actor().await {
      candidate.insert(self.config().owner_field.clone(), actor.id);
    }

    if self.is_fallback() {
      return self.insert_local(candidate).await;
    }

    let attempt = self
      .retry_stripping(candidate.clone(), true, move |payload| async move {
        self.remote().insert(&self.name, &payload).await
      })
      .await;

    match attempt {
      Ok(record) => {
        self.with_state(|s| {
          if let Some(id) = record.id() {
            s.view.retain(|r| !r.has_id(&id));
          }
          s.view.insert(0, record.clone());
        });
        Ok(record)
      }
      Err(err) => {
        self.absorb_write_error("insert", err)?;
        self.insert_local(candidate).await
      }
    }
  }

  /// Merge `fields` into the record with `id`. Returns `None` when no such
  /// record exists.
  pub async fn update(&self, id: &RecordId, mut fields: Record) -> Result<Option<Record>> {
    fields.remove(ID_FIELD);

    if self.is_fallback() {
      return self.merge_into_local(id, &fields, None).await;
    }

    let cached = self.find(id);
    let current = cached.clone();
    let attempt = self
      .retry_stripping(fields.clone(), false, move |payload| {
        let current = current.clone();
        async move {
          if payload.is_empty() {
            return Ok(current);
          }
          self.remote().update(&self.name, id, &payload).await
        }
      })
      .await;

    match attempt {
      Ok(Some(record)) => {
        self.with_state(|s| {
          if let Some(slot) = s.view.iter_mut().find(|r| r.has_id(id)) {
            *slot = record.clone();
          }
        });
        Ok(Some(record))
      }
      Ok(None) => Ok(None),
      Err(err) => {
        self.absorb_write_error("update", err)?;
        self.merge_into_local(id, &fields, cached).await
      }
    }
  }

  /// Delete the record with `id`.
  ///
  /// In fallback mode a missing id is a no-op. Otherwise the remote failure
  /// is returned as-is; deletes never fall back to local storage.
  pub async fn remove(&self, id: &RecordId) -> Result<()> {
    if self.is_fallback() {
      let mut rows = self.read_local().await?;
      rows.retain(|r| !r.has_id(id));
      self.write_local(&rows).await?;
      self.with_state(|s| s.view = rows);
      return Ok(());
    }

    self
      .remote()
      .delete(&self.name, id)
      .await
      .inspect_err(|err| warn!(table = %self.name, %id, error = %err, "remote delete failed"))?;
    self.with_state(|s| s.view.retain(|r| !r.has_id(id)));
    Ok(())
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn config(&self) -> &AccessorConfig { &self.accessor.config }

  fn remote(&self) -> &R { &self.accessor.remote }

  fn state(&self) -> MutexGuard<'_, TableState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn with_state<T>(&self, f: impl FnOnce(&mut TableState) -> T) -> T { f(&mut self.state()) }

  /// Run `op`, stripping one field per schema complaint and retrying.
  ///
  /// Attempts are capped at one more than the payload's field count, so the
  /// loop ends even if every attempt names a different column. When
  /// `owner_retry` is set, an error that mentions the owner field strips that
  /// field once.
  async fn retry_stripping<T, F, Fut>(
    &self,
    mut payload: Record,
    owner_retry: bool,
    mut op: F,
  ) -> Result<T, RemoteError>
  where
    F: FnMut(Record) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
  {
    let owner = self.config().owner_field.as_str();
    let max_attempts = payload.len() + 1;
    let mut owner_stripped = !owner_retry;
    let mut attempt = 0;

    loop {
      attempt += 1;
      let err = match op(payload.clone()).await {
        Ok(value) => return Ok(value),
        Err(err) => err,
      };
      if attempt >= max_attempts {
        return Err(err);
      }

      if let Some(column) = err.missing_column()
        && payload.remove(&column).is_some()
      {
        debug!(table = %self.name, %column, "remote schema lacks column; retrying without it");
        continue;
      }

      if !owner_stripped && mentions_field(&err.message, owner) && payload.remove(owner).is_some() {
        owner_stripped = true;
        debug!(table = %self.name, field = owner, "remote rejected owner field; retrying without it");
        continue;
      }

      return Err(err);
    }
  }

  /// Decide whether a failed remote write may continue into local storage,
  /// and if so switch the handle to fallback mode.
  fn absorb_write_error(&self, op: &str, err: RemoteError) -> Result<()> {
    if err.class == ErrorClass::Other && !self.config().fallback_on_write_error {
      warn!(table = %self.name, op, error = %err, "remote write failed");
      return Err(Error::RemoteWriteFailed { table: self.name.clone(), source: err });
    }
    warn!(table = %self.name, op, error = %err, "remote write failed; switching to on-device storage");
    self.with_state(|s| {
      s.phase = Phase::FallbackActive;
      s.fallback = true;
      s.last_error = Some(err.to_string());
    });
    Ok(())
  }

  async fn insert_local(&self, mut record: Record) -> Result<Record> {
    record.insert(ID_FIELD, Uuid::new_v4().to_string());
    record.insert(CREATED_AT_FIELD, Utc::now().to_rfc3339());

    let mut rows = self.read_local().await?;
    rows.insert(0, record.clone());
    self.write_local(&rows).await?;
    self.with_state(|s| s.view = rows);

    debug!(table = %self.name, id = ?record.id(), "record written to on-device storage");
    Ok(record)
  }

  /// Merge `fields` into the on-device copy of `id`. A record only known from
  /// the remote view (`cached`) joins the on-device list first; other
  /// on-device records are left as they are.
  async fn merge_into_local(
    &self,
    id: &RecordId,
    fields: &Record,
    cached: Option<Record>,
  ) -> Result<Option<Record>> {
    let mut rows = self.read_local().await?;
    if !rows.iter().any(|r| r.has_id(id)) {
      let Some(record) = cached else {
        return Ok(None);
      };
      rows.insert(0, record);
    }
    self.merge_and_persist(rows, id, fields).await
  }

  async fn merge_and_persist(
    &self,
    mut rows: Vec<Record>,
    id: &RecordId,
    fields: &Record,
  ) -> Result<Option<Record>> {
    let Some(slot) = rows.iter_mut().find(|r| r.has_id(id)) else {
      return Ok(None);
    };
    slot.merge(fields);
    let record = slot.clone();

    self.write_local(&rows).await?;
    self.with_state(|s| s.view = rows);
    Ok(Some(record))
  }

  async fn read_local(&self) -> Result<Vec<Record>> {
    let raw = self
      .accessor
      .local
      .read(&self.key)
      .await
      .map_err(|e| Error::LocalStorage(Box::new(e)))?;
    match raw {
      Some(json) => Ok(serde_json::from_str(&json)?),
      None => Ok(Vec::new()),
    }
  }

  async fn write_local(&self, rows: &[Record]) -> Result<()> {
    let json = serde_json::to_string(rows)?;
    self
      .accessor
      .local
      .write(&self.key, json)
      .await
      .map_err(|e| Error::LocalStorage(Box::new(e)))
  }
}
