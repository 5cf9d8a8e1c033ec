//! Handlers for `/projects` endpoints.
//!
//! Every project response is a [`ProjectSummary`] computed at request time,
//! so status and the remaining-time label always reflect the current clock.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use fund_core::{
  lifecycle::ProjectSummary,
  project::{NewComment, NewProject, Rating},
  store::Backend,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::CurrentUser};

/// `POST /projects`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(mut draft): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
  let now = Utc::now();
  draft.creator_id = user.principal.principal_id;
  let project = state.projects.create(draft, now).await?;
  let summary = state.projects.summarize(project, now).await?;
  Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /projects/{id}`
pub async fn show<S: Backend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ProjectSummary>, ApiError> {
  let project = state.projects.get(id).await?;
  Ok(Json(state.projects.summarize(project, Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
pub struct RatingBody {
  pub value: u8,
}

/// `PUT /projects/{id}/rating`, body: `{"value":4}`
///
/// Rating again replaces the caller's earlier value.
pub async fn rate<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<RatingBody>,
) -> Result<Json<Rating>, ApiError> {
  let rating = state
    .projects
    .rate(id, user.principal.principal_id, body.value, Utc::now())
    .await?;
  Ok(Json(rating))
}

/// `POST /projects/{id}/cancel`
pub async fn cancel<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ProjectSummary>, ApiError> {
  let project = state.projects.cancel(id, user.principal.principal_id).await?;
  Ok(Json(state.projects.summarize(project, Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
pub struct DonationBody {
  pub amount: Decimal,
}

/// `POST /projects/{id}/donations`, body: `{"amount":"25.00"}`
pub async fn donate<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<DonationBody>,
) -> Result<impl IntoResponse, ApiError> {
  let donation = state
    .projects
    .donate(id, user.principal.principal_id, body.amount, Utc::now())
    .await?;
  Ok((StatusCode::CREATED, Json(donation)))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body:      String,
  #[serde(default)]
  pub parent_id: Option<Uuid>,
}

/// `POST /projects/{id}/comments`, body: `{"body":"...","parent_id":null}`
pub async fn comment<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = state
    .projects
    .comment(NewComment {
      project_id: id,
      author_id:  user.principal.principal_id,
      parent_id:  body.parent_id,
      body:       body.body,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}
