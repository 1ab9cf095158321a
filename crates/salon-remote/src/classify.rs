//! Mapping PostgREST error responses onto [`ErrorClass`].

use salon_core::remote::{ErrorClass, RemoteError};
use serde::Deserialize;

/// Error body returned by PostgREST. `details` and `hint` are ignored.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  code:    Option<String>,
  message: Option<String>,
}

/// Class of a failure given its protocol code and HTTP status.
///
/// | Code | Meaning |
/// |------|---------|
/// | `42P01` | PostgreSQL undefined_table |
/// | `PGRST205` | table not in PostgREST's schema cache |
/// | `42703` | PostgreSQL undefined_column |
/// | `PGRST204` | column not in PostgREST's schema cache |
///
/// A bare 404 with no code means the endpoint for the table is missing.
pub fn class_for(code: Option<&str>, status: u16) -> ErrorClass {
  match code {
    Some("42P01" | "PGRST205") => ErrorClass::UndefinedTable,
    Some("42703" | "PGRST204") => ErrorClass::UndefinedColumn,
    Some(_) => ErrorClass::Other,
    None if status == 404 => ErrorClass::UndefinedTable,
    None => ErrorClass::Other,
  }
}

/// Build a [`RemoteError`] from a non-success response.
pub fn from_response(status: u16, body: &str) -> RemoteError {
  let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
    Ok(parsed) => (parsed.code, parsed.message.unwrap_or_else(|| body.to_owned())),
    Err(_) if body.trim().is_empty() => (None, format!("HTTP {status}")),
    Err(_) => (None, body.to_owned()),
  };

  let err = RemoteError::new(class_for(code.as_deref(), status), message).with_status(status);
  match code {
    Some(code) => err.with_code(code),
    None => err,
  }
}
