//! JSON API over the resilient table accessor.
//!
//! Exposes an axum [`Router`] with one resource per logical table, backed by
//! any combination of [`RemoteStore`], [`LocalStore`] and [`ActorProvider`].
//!
//! | Method   | Path                    | Operation |
//! |----------|-------------------------|-----------|
//! | `GET`    | `/tables/{table}`       | list      |
//! | `POST`   | `/tables/{table}`       | insert    |
//! | `PATCH`  | `/tables/{table}/{id}`  | update    |
//! | `DELETE` | `/tables/{table}/{id}`  | remove    |
//! | `GET`    | `/status/{table}`       | status    |

pub mod auth;
pub mod error;
pub mod tables;

pub use error::ApiError;

use std::{
  collections::HashMap,
  path::PathBuf,
  sync::{Arc, Mutex, PoisonError},
};

use axum::{
  Router,
  routing::{get, patch},
};
use salon_core::{
  Accessor, AccessorConfig, TableHandle, actor::ActorProvider, local::LocalStore,
  remote::RemoteStore,
};
use salon_remote::RemoteConfig;
use serde::Deserialize;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// SQLite file backing the on-device fallback store.
  pub store_path:         PathBuf,
  pub remote:             RemoteConfig,
  #[serde(default)]
  pub accessor:           AccessorConfig,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

// ─── Table registry ───────────────────────────────────────────────────────────

/// Table handles, created on first request and kept for the server's
/// lifetime so each table's cached view and fallback flag persist across
/// requests.
pub struct Tables<R, L, A> {
  accessor: Accessor<R, L, A>,
  handles:  Mutex<HashMap<String, Arc<TableHandle<R, L, A>>>>,
}

impl<R, L, A> Tables<R, L, A>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  pub fn new(accessor: Accessor<R, L, A>) -> Self {
    Self { accessor, handles: Mutex::new(HashMap::new()) }
  }

  pub fn handle(&self, table: &str) -> Arc<TableHandle<R, L, A>> {
    let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(
      handles
        .entry(table.to_owned())
        .or_insert_with(|| Arc::new(self.accessor.table(table))),
    )
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<R, L, A> {
  pub tables: Arc<Tables<R, L, A>>,
  pub auth:   Arc<AuthConfig>,
}

impl<R, L, A> Clone for AppState<R, L, A> {
  fn clone(&self) -> Self {
    Self { tables: Arc::clone(&self.tables), auth: Arc::clone(&self.auth) }
  }
}

impl<R, L, A> AppState<R, L, A>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  pub fn new(accessor: Accessor<R, L, A>, auth: AuthConfig) -> Self {
    Self { tables: Arc::new(Tables::new(accessor)), auth: Arc::new(auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router. Every route requires basic auth.
pub fn router<R, L, A>(state: AppState<R, L, A>) -> Router
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  Router::new()
    .route(
      "/tables/{table}",
      get(tables::list::<R, L, A>).post(tables::insert::<R, L, A>),
    )
    .route(
      "/tables/{table}/{id}",
      patch(tables::update::<R, L, A>).delete(tables::remove::<R, L, A>),
    )
    .route("/status/{table}", get(tables::status::<R, L, A>))
    .with_state(state)
}
