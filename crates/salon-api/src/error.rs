//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use salon_core::remote::RemoteError;
use serde_json::json;
use thiserror::Error;

use crate::auth::REALM;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The remote store refused a write that was not absorbed locally.
  #[error("remote store error: {0}")]
  Remote(#[source] RemoteError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<salon_core::Error> for ApiError {
  fn from(err: salon_core::Error) -> Self {
    match err {
      salon_core::Error::Remote(e) => ApiError::Remote(e),
      salon_core::Error::RemoteWriteFailed { source, .. } => ApiError::Remote(source),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Remote(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED
      && let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{REALM}\""))
    {
      res.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
    }
    res
  }
}
