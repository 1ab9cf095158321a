//! Accessor configuration.

use serde::{Deserialize, Serialize};

use crate::record::CREATED_AT_FIELD;

/// Knobs shared by every table handle created from one
/// [`Accessor`](crate::accessor::Accessor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorConfig {
  /// Prepended to the table name to form the on-device storage key.
  pub storage_prefix:          String,
  /// Field stamped with the current actor's id on insert.
  pub owner_field:             String,
  /// Column used for descending-creation-order reads.
  pub order_field:             String,
  /// Whether a generic (non-schema) remote failure on insert/update is
  /// absorbed into local storage. When off, the failure is returned.
  pub fallback_on_write_error: bool,
}

impl Default for AccessorConfig {
  fn default() -> Self {
    Self {
      storage_prefix:          "salon_".to_owned(),
      owner_field:             "user_id".to_owned(),
      order_field:             CREATED_AT_FIELD.to_owned(),
      fallback_on_write_error: true,
    }
  }
}

impl AccessorConfig {
  pub fn storage_key(&self, table: &str) -> String { format!("{}{table}", self.storage_prefix) }
}
