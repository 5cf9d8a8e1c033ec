//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Core errors are rendered through [`fund_core::Error::public_message`], so
//! token and credential failures reach the client already collapsed.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fund_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  /// No principal in the slot the route requires.
  #[error("authentication required")]
  Unauthorized,

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Core(e) => core_status(e),
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::NotFound | CoreError::Expired | CoreError::InvalidInput(_) => {
      StatusCode::BAD_REQUEST
    }
    CoreError::InvalidCredentials | CoreError::WrongPrivilegeClass => StatusCode::UNAUTHORIZED,
    CoreError::Inactive | CoreError::NotCreator => StatusCode::FORBIDDEN,
    CoreError::PrincipalNotFound(_)
    | CoreError::ProjectNotFound(_)
    | CoreError::ContentNotFound => StatusCode::NOT_FOUND,
    CoreError::AlreadyReported
    | CoreError::NotCancelable
    | CoreError::NotAcceptingDonations => StatusCode::CONFLICT,
    CoreError::ContractViolation { .. }
    | CoreError::AmountOverflow
    | CoreError::PasswordHash(_)
    | CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let message = match &self {
      Self::Core(e) => e.public_message(),
      Self::Unauthorized => self.to_string(),
      Self::Conflict(m) => m.clone(),
      Self::Internal(_) => "internal error".to_owned(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
