//! Error types for `salon-core`.

use thiserror::Error;

use crate::remote::RemoteError;

/// Failures that escape a [`TableHandle`](crate::accessor::TableHandle).
///
/// Most remote failures are absorbed by retry or local fallback; only the
/// cases below reach the caller.
#[derive(Debug, Error)]
pub enum Error {
  /// A remote delete failed. Deletes are never redirected to local storage.
  #[error("remote store error: {0}")]
  Remote(#[from] RemoteError),

  /// A generic remote write failure while local fallback for writes is off.
  #[error("remote write to {table} failed: {source}")]
  RemoteWriteFailed {
    table:  String,
    #[source]
    source: RemoteError,
  },

  /// The on-device store could not be read or written.
  #[error("local storage error: {0}")]
  LocalStorage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
