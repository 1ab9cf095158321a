//! Handlers for `/tables/{table}` and `/status/{table}` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tables/:table` | Newest first; never fails |
//! | `POST`   | `/tables/:table` | Body: JSON object; 201 + stored record |
//! | `PATCH`  | `/tables/:table/:id` | Body: fields to merge; 404 if absent |
//! | `DELETE` | `/tables/:table/:id` | 204; 502 if the remote delete fails |
//! | `GET`    | `/status/:table` | Phase and fallback flag |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use salon_core::{
  Record, RecordId, TableHandle, TableStatus, actor::ActorProvider, local::LocalStore,
  remote::RemoteStore, valid_table_name,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

fn handle<R, L, A>(
  state: &AppState<R, L, A>,
  table: &str,
) -> Result<Arc<TableHandle<R, L, A>>, ApiError>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  if !valid_table_name(table) {
    return Err(ApiError::BadRequest(format!("invalid table name {table:?}")));
  }
  Ok(state.tables.handle(table))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /tables/:table`
pub async fn list<R, L, A>(
  _auth: Authenticated,
  State(state): State<AppState<R, L, A>>,
  Path(table): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  let handle = handle(&state, &table)?;
  Ok(Json(handle.list().await))
}

// ─── Insert ───────────────────────────────────────────────────────────────────

/// `POST /tables/:table`. Body is the record's fields.
pub async fn insert<R, L, A>(
  _auth: Authenticated,
  State(state): State<AppState<R, L, A>>,
  Path(table): Path<String>,
  Json(fields): Json<Record>,
) -> Result<impl IntoResponse, ApiError>
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  let record = handle(&state, &table)?.insert(fields).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `GET /status/:table`
pub async fn status<R, L, A>(
  _auth: Authenticated,
  State(state): State<AppState<R, L, A>>,
  Path(table): Path<String>,
) -> Result<Json<TableStatus>, ApiError>
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  Ok(Json(handle(&state, &table)?.status()))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /tables/:table/:id`. Body is the fields to merge.
pub async fn update<R, L, A>(
  _auth: Authenticated,
  State(state): State<AppState<R, L, A>>,
  Path((table, id)): Path<(String, String)>,
  Json(fields): Json<Record>,
) -> Result<Json<Record>, ApiError>
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  let id = RecordId::from(id);
  handle(&state, &table)?
    .update(&id, fields)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("{table}/{id} not found")))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /tables/:table/:id`
pub async fn remove<R, L, A>(
  _auth: Authenticated,
  State(state): State<AppState<R, L, A>>,
  Path((table, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  handle(&state, &table)?.remove(&RecordId::from(id)).await?;
  Ok(StatusCode::NO_CONTENT)
}
