//! Operator login for the table API.
//!
//! Every route sits behind a single operator account configured with
//! `auth_username` and an argon2 `auth_password_hash`, sent as HTTP Basic
//! credentials. Rejections carry a `WWW-Authenticate` challenge for
//! [`REALM`].

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use salon_core::{actor::ActorProvider, local::LocalStore, remote::RemoteStore};
use tracing::debug;

use crate::{AppState, error::ApiError};

/// Realm announced in the `WWW-Authenticate` challenge.
pub const REALM: &str = "salon tables";

/// Operator credentials accepted by this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by `salon-server --hash-password`.
  pub password_hash: String,
}

/// Extractor proving the request carried the operator's credentials.
pub struct Authenticated;

/// `(username, password)` from an `Authorization: Basic …` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded.trim()).ok()?).ok()?;
  let (user, pass) = decoded.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Check the request's Basic credentials against the operator account.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let Some((username, password)) = basic_credentials(headers) else {
    debug!("request without usable basic credentials");
    return Err(ApiError::Unauthorized);
  };
  if username != config.username {
    debug!(%username, "login for unknown operator");
    return Err(ApiError::Unauthorized);
  }

  let hash = PasswordHash::new(&config.password_hash).map_err(|e| {
    debug!(error = %e, "configured password hash is not a PHC string");
    ApiError::Unauthorized
  })?;
  Argon2::default()
    .verify_password(password.as_bytes(), &hash)
    .map_err(|_| {
      debug!(%username, "wrong operator password");
      ApiError::Unauthorized
    })
}

impl<R, L, A> FromRequestParts<AppState<R, L, A>> for Authenticated
where
  R: RemoteStore + 'static,
  L: LocalStore + 'static,
  A: ActorProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<R, L, A>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(|()| Authenticated)
  }
}
