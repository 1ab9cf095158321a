//! On-device persistent key-value storage.
//!
//! The fallback store holds one serialised record list per table, under
//! `storage_prefix + table`. It is shared by every handle that uses the same
//! store; concurrent writers race and the last write wins.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Mutex, PoisonError},
};

/// A string key-value store that survives the session.
pub trait LocalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Value stored under `key`, or `None` if the key is absent.
  fn read<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous value.
  fn write<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// In-process [`LocalStore`], for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Synchronous peek at a stored value.
  pub fn get(&self, key: &str) -> Option<String> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }
}

impl LocalStore for MemoryStore {
  type Error = Infallible;

  async fn read(&self, key: &str) -> Result<Option<String>, Infallible> { Ok(self.get(key)) }

  async fn write(&self, key: &str, value: String) -> Result<(), Infallible> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_owned(), value);
    Ok(())
  }
}
