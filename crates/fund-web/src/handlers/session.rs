//! Handlers for `/session` endpoints.
//!
//! Each login route fills one slot and leaves the other untouched. Every
//! successful login moves the session to a freshly generated handle, so a
//! cookie chosen before authentication never carries an identity.

use axum::{
  Json,
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use fund_core::{
  Error as CoreError,
  auth::Authenticator,
  principal::Principal,
  session::SessionHandle,
  store::Backend,
};
use serde::Serialize;
use uuid::Uuid;

use super::Credentials;
use crate::{
  AppState,
  error::ApiError,
  session::{MaybeSession, session_cookie},
};

// ─── Show ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub user:  Option<Principal>,
  pub admin: Option<Principal>,
}

/// `GET /session`
pub async fn show<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
) -> Result<Json<SessionView>, ApiError> {
  let Some(session) = session else {
    return Ok(Json(SessionView { user: None, admin: None }));
  };
  let user = state.sessions.get_user(&session).await?;
  let admin = state.sessions.get_admin(&session).await?;
  Ok(Json(SessionView {
    user:  load(&state, user).await?,
    admin: load(&state, admin).await?,
  }))
}

async fn load<S: Backend>(
  state: &AppState<S>,
  principal_id: Option<Uuid>,
) -> Result<Option<Principal>, ApiError> {
  let Some(id) = principal_id else {
    return Ok(None);
  };
  Ok(state.store.get_principal(id).await.map_err(CoreError::store)?)
}

// ─── Log in ───────────────────────────────────────────────────────────────────

async fn log_in<S: Backend>(
  state: &AppState<S>,
  authenticator: &Authenticator<S>,
  session: Option<SessionHandle>,
  creds: Credentials,
) -> Result<Response, ApiError> {
  let (session, principal) = authenticator
    .log_in(&state.sessions, session.as_ref(), &creds.email, &creds.password)
    .await?;

  let mut response = Json(principal).into_response();
  response.headers_mut().insert(
    header::SET_COOKIE,
    session_cookie(&session, state.config.secure_cookies)?,
  );
  Ok(response)
}

/// `POST /session/user`, body: `{"email":"...","password":"..."}`
pub async fn user_log_in<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
  Json(creds): Json<Credentials>,
) -> Result<Response, ApiError> {
  log_in(&state, &state.users, session, creds).await
}

/// `POST /session/admin`, body: `{"email":"...","password":"..."}`
pub async fn admin_log_in<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
  Json(creds): Json<Credentials>,
) -> Result<Response, ApiError> {
  log_in(&state, &state.admins, session, creds).await
}

// ─── Log out ──────────────────────────────────────────────────────────────────

/// `DELETE /session/user`
pub async fn user_log_out<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
) -> Result<StatusCode, ApiError> {
  if let Some(session) = session {
    state.sessions.clear_user(&session).await?;
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /session/admin`
pub async fn admin_log_out<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
) -> Result<StatusCode, ApiError> {
  if let Some(session) = session {
    state.sessions.clear_admin(&session).await?;
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /session`
pub async fn log_out_all<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
) -> Result<StatusCode, ApiError> {
  if let Some(session) = session {
    state.sessions.clear_all(&session).await?;
  }
  Ok(StatusCode::NO_CONTENT)
}
