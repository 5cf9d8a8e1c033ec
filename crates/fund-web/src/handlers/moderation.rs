//! Report endpoints. A report that brings the count to the threshold removes
//! the content in the same request.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use fund_core::{
  moderation::{ContentRef, ReportOutcome},
  store::Backend,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ReportBody {
  pub reason: String,
}

async fn submit<S: Backend>(
  state: &AppState<S>,
  user: &CurrentUser,
  content: ContentRef,
  reason: String,
) -> Result<(StatusCode, Json<ReportOutcome>), ApiError> {
  let outcome = state
    .moderation
    .submit(user.principal.principal_id, content, reason)
    .await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `POST /projects/{id}/reports`, body: `{"reason":"..."}`
pub async fn report_project<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ReportBody>,
) -> Result<impl IntoResponse, ApiError> {
  submit(&state, &user, ContentRef::Project(id), body.reason).await
}

/// `POST /comments/{id}/reports`, body: `{"reason":"..."}`
pub async fn report_comment<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ReportBody>,
) -> Result<impl IntoResponse, ApiError> {
  submit(&state, &user, ContentRef::Comment(id), body.reason).await
}
