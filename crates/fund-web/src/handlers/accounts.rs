//! Handlers for `/accounts` endpoints: registration, activation, password
//! reset and change, and account deletion.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use fund_core::{
  Error as CoreError,
  password::{hash_password, verify_secret},
  principal::{NewPrincipal, normalize_email},
  store::Backend,
  token::{TokenId, TokenKind},
};
use serde::Deserialize;
use serde_json::json;

use super::PasswordBody;
use crate::{AppState, error::ApiError, session::CurrentUser};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub password:   String,
}

/// `POST /accounts`
///
/// Creates an inactive account and sends its activation link.
pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.email.trim().is_empty() || !body.email.contains('@') {
    return Err(CoreError::InvalidInput("a valid email address is required".into()).into());
  }
  let hash = hash_password(&body.password)?;
  let principal = state
    .store
    .create_principal(NewPrincipal::ordinary(
      body.email,
      body.first_name,
      body.last_name,
      hash,
    ))
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| ApiError::Conflict("an account with this email already exists".into()))?;

  let token = state
    .tokens
    .issue(TokenKind::Activation, principal.principal_id, Utc::now())
    .await?;
  state.notifier.send_activation_link(&principal, &token.id)?;
  tracing::info!(principal_id = %principal.principal_id, "registered account");

  Ok((StatusCode::CREATED, Json(principal)))
}

// ─── Activate ─────────────────────────────────────────────────────────────────

/// `POST /accounts/activate/{token}`
pub async fn activate<S: Backend>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let owner = state
    .tokens
    .validate(TokenKind::Activation, &TokenId::new(token), Utc::now())
    .await?;
  if !state
    .store
    .activate_principal(owner)
    .await
    .map_err(CoreError::store)?
  {
    return Err(CoreError::PrincipalNotFound(owner).into());
  }
  tracing::info!(principal_id = %owner, "activated account");
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
  pub email: String,
}

/// `POST /accounts/activate`, body: `{"email":"..."}`
///
/// Sends a fresh activation link to an inactive account, invalidating the
/// previous one. Answers 202 for any address.
pub async fn resend_activation<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<EmailBody>,
) -> Result<impl IntoResponse, ApiError> {
  let found = state
    .store
    .find_by_email(normalize_email(&body.email))
    .await
    .map_err(CoreError::store)?;

  if let Some(principal) = found.filter(|p| !p.is_active) {
    let token = state
      .tokens
      .issue(TokenKind::Activation, principal.principal_id, Utc::now())
      .await?;
    if let Err(e) = state.notifier.send_activation_link(&principal, &token.id) {
      tracing::warn!(error = %e, "failed to resend activation link");
    }
  }
  Ok(StatusCode::ACCEPTED)
}

// ─── Password reset ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
  pub email: String,
}

/// `POST /accounts/password-reset`
///
/// Answers 202 whether or not the address belongs to an account, so the
/// route cannot be used to enumerate accounts.
pub async fn request_reset<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<ResetRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
  let found = state
    .store
    .find_by_email(normalize_email(&body.email))
    .await
    .map_err(CoreError::store)?;

  if let Some(principal) = found.filter(|p| p.is_active) {
    let token = state
      .tokens
      .issue(TokenKind::PasswordReset, principal.principal_id, Utc::now())
      .await?;
    if let Err(e) = state.notifier.send_password_reset_link(&principal, &token.id) {
      tracing::warn!(error = %e, "failed to send password reset link");
    }
  }
  Ok(StatusCode::ACCEPTED)
}

/// `GET /accounts/password-reset/{token}`
///
/// Checks the link without consuming it.
pub async fn check_reset<S: Backend>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  state
    .tokens
    .validate(TokenKind::PasswordReset, &TokenId::new(token), Utc::now())
    .await?;
  Ok(Json(json!({ "valid": true })))
}

/// `POST /accounts/password-reset/{token}`, body: `{"password":"..."}`
pub async fn complete_reset<S: Backend>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
  Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let token = TokenId::new(token);
  let owner = state
    .tokens
    .validate(TokenKind::PasswordReset, &token, Utc::now())
    .await?;
  let hash = hash_password(&body.password)?;
  if !state
    .store
    .set_password_hash(owner, hash)
    .await
    .map_err(CoreError::store)?
  {
    return Err(CoreError::PrincipalNotFound(owner).into());
  }
  state.tokens.consume(TokenKind::PasswordReset, &token).await?;
  tracing::info!(principal_id = %owner, "password reset");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Change password ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
  pub old_password: String,
  pub new_password: String,
}

/// `POST /accounts/me/password`, body: `{"old_password":"...","new_password":"..."}`
pub async fn change_password<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<ChangePasswordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let principal_id = user.principal.principal_id;
  if !verify_secret(&user.principal.password_hash, &body.old_password) {
    return Err(CoreError::InvalidCredentials.into());
  }
  let hash = hash_password(&body.new_password)?;
  if !state
    .store
    .set_password_hash(principal_id, hash)
    .await
    .map_err(CoreError::store)?
  {
    return Err(CoreError::PrincipalNotFound(principal_id).into());
  }
  tracing::info!(%principal_id, "password changed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /accounts/me`, body: `{"password":"..."}`
///
/// Removes the account and everything it owns, then empties the User slot.
/// The Admin slot of the same session is left alone.
pub async fn delete_me<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let principal_id = user.principal.principal_id;
  if !verify_secret(&user.principal.password_hash, &body.password) {
    return Err(CoreError::InvalidCredentials.into());
  }
  state.tokens.revoke_all(principal_id).await?;
  state
    .store
    .delete_principal(principal_id)
    .await
    .map_err(CoreError::store)?;
  state.sessions.clear_user(&user.session).await?;
  tracing::info!(%principal_id, "deleted account");
  Ok(StatusCode::NO_CONTENT)
}
