//! Session cookie handling and identity extractors.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use fund_core::{
  Error as CoreError,
  principal::Principal,
  session::SessionHandle,
  store::Backend,
};

use crate::{AppState, error::ApiError};

/// Name of the cookie carrying the session handle.
pub const SESSION_COOKIE: &str = "fund_session";

/// Find the session handle among the request's `Cookie` headers.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionHandle> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| SessionHandle::new(value))
}

/// The `Set-Cookie` value that hands `handle` to the client.
pub fn session_cookie(handle: &SessionHandle, secure: bool) -> Result<HeaderValue, ApiError> {
  let mut cookie = format!(
    "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
    handle.as_str()
  );
  if secure {
    cookie.push_str("; Secure");
  }
  HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.to_string()))
}

/// The request's session handle, if it presented one.
pub struct MaybeSession(pub Option<SessionHandle>);

impl<T: Send + Sync> FromRequestParts<T> for MaybeSession {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
    Ok(MaybeSession(session_from_headers(&parts.headers)))
  }
}

/// The principal held by the session's User slot.
///
/// Rejects with 401 when there is no session, the slot is empty, or the
/// principal no longer exists.
pub struct CurrentUser {
  pub session:   SessionHandle,
  pub principal: Principal,
}

impl<S: Backend> FromRequestParts<AppState<S>> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = session_from_headers(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let principal_id = state
      .sessions
      .get_user(&session)
      .await?
      .ok_or(ApiError::Unauthorized)?;
    let principal = state
      .store
      .get_principal(principal_id)
      .await
      .map_err(CoreError::store)?
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser { session, principal })
  }
}
