//! The `RemoteStore` trait and its error type.
//!
//! The trait is implemented by the hosted database client (`salon-remote`).
//! [`TableHandle`](crate::accessor::TableHandle) depends on this abstraction so
//! its fallback logic can be exercised against scripted fakes.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Record, RecordId};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Machine-readable class of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
  /// The requested table does not exist.
  UndefinedTable,
  /// A referenced column does not exist.
  UndefinedColumn,
  /// Anything else: permissions, constraints, transport, timeouts.
  Other,
}

/// A failure reported by (or while talking to) the remote store.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RemoteError {
  pub class:   ErrorClass,
  /// Protocol error code, e.g. `42P01` or `PGRST204`.
  pub code:    Option<String>,
  /// HTTP status, when a response was received.
  pub status:  Option<u16>,
  pub message: String,
}

impl RemoteError {
  pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
    Self { class, code: None, status: None, message: message.into() }
  }

  pub fn undefined_table(message: impl Into<String>) -> Self {
    Self::new(ErrorClass::UndefinedTable, message)
  }

  pub fn undefined_column(message: impl Into<String>) -> Self {
    Self::new(ErrorClass::UndefinedColumn, message)
  }

  pub fn other(message: impl Into<String>) -> Self { Self::new(ErrorClass::Other, message) }

  pub fn with_code(mut self, code: impl Into<String>) -> Self {
    self.code = Some(code.into());
    self
  }

  pub fn with_status(mut self, status: u16) -> Self {
    self.status = Some(status);
    self
  }

  pub fn is_undefined_table(&self) -> bool { self.class == ErrorClass::UndefinedTable }

  pub fn is_undefined_column(&self) -> bool { self.class == ErrorClass::UndefinedColumn }

  /// Column named by an undefined-column error. Other classes never name one.
  pub fn missing_column(&self) -> Option<String> {
    if self.is_undefined_column() {
      crate::schema_error::missing_column(&self.message)
    } else {
      None
    }
  }
}

// ─── Query shape ─────────────────────────────────────────────────────────────

/// Ordering clause for [`RemoteStore::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub column:     String,
  pub descending: bool,
}

impl OrderBy {
  pub fn desc(column: impl Into<String>) -> Self {
    Self { column: column.into(), descending: true }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A REST-like query/insert/update/delete interface over named tables.
///
/// All methods return `Send` futures so table handles can be shared across a
/// multi-threaded runtime.
pub trait RemoteStore: Send + Sync {
  /// Read every row of `table`, optionally ordered.
  fn select<'a>(
    &'a self,
    table: &'a str,
    order: Option<&'a OrderBy>,
  ) -> impl Future<Output = Result<Vec<Record>, RemoteError>> + Send + 'a;

  /// Insert one row and return it as stored (with server-assigned fields).
  fn insert<'a>(
    &'a self,
    table: &'a str,
    record: &'a Record,
  ) -> impl Future<Output = Result<Record, RemoteError>> + Send + 'a;

  /// Update the row with `id`. Returns `None` when no row matched.
  fn update<'a>(
    &'a self,
    table: &'a str,
    id: &'a RecordId,
    fields: &'a Record,
  ) -> impl Future<Output = Result<Option<Record>, RemoteError>> + Send + 'a;

  /// Delete the row with `id`.
  fn delete<'a>(
    &'a self,
    table: &'a str,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<(), RemoteError>> + Send + 'a;
}
