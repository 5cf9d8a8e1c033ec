//! Project lifecycle: computed status, cancellation, and funding.
//!
//! A project's status is never advanced by a write. It is recomputed from the
//! stored status and the clock on every read, so it can never be stale:
//!
//! ```text
//! Canceled                  -> Canceled   (terminal, absorbing)
//! now >  end_at             -> Completed
//! otherwise                 -> Active     (including not yet started)
//! ```
//!
//! The raised amount always comes from the [`DonationLedger`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  project::{
    CancelUpdate, Comment, Donation, DonationInsert, NewComment, NewProject, Project,
    ProjectStatus, RATING_RANGE, Rating, RatingStats, validate_donation,
  },
  store::{DonationLedger, ProjectStore},
};

/// A project may be canceled while it has raised less than this fraction of
/// its target.
pub const CANCEL_FRACTION: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

// ─── Pure rules ──────────────────────────────────────────────────────────────

/// The current status of a project with the given stored status and end time.
pub fn compute_status(
  stored: ProjectStatus,
  end_at: DateTime<Utc>,
  now: DateTime<Utc>,
) -> ProjectStatus {
  if stored == ProjectStatus::Canceled {
    ProjectStatus::Canceled
  } else if now > end_at {
    ProjectStatus::Completed
  } else {
    ProjectStatus::Active
  }
}

pub fn can_cancel(raised: Decimal, target: Decimal) -> bool {
  target
    .checked_mul(CANCEL_FRACTION)
    .is_some_and(|limit| raised < limit)
}

pub fn is_funded(raised: Decimal, target: Decimal) -> bool { raised >= target }

/// Percentage of the target raised so far; zero for a non-positive target.
pub fn progress_percent(raised: Decimal, target: Decimal) -> Result<Decimal> {
  if target <= Decimal::ZERO {
    return Ok(Decimal::ZERO);
  }
  raised
    .checked_div(target)
    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    .map(|pct| pct.round_dp(2))
    .ok_or(Error::AmountOverflow)
}

/// Human-readable time remaining. Presentation only.
pub fn remaining_time_label(
  status: ProjectStatus,
  end_at: DateTime<Utc>,
  now: DateTime<Utc>,
) -> String {
  if status == ProjectStatus::Completed || now > end_at {
    return "Ended".to_owned();
  }
  let remaining = end_at - now;
  match remaining.num_days() {
    days if days > 1 => format!("{days} days left"),
    1 => "Last day!".to_owned(),
    _ => match remaining.num_hours() {
      hours if hours > 1 => format!("{hours} hours left"),
      1 => "1 hour left!".to_owned(),
      _ => "Ending soon!".to_owned(),
    },
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A project together with everything derived from the clock and the ledger.
/// Never stored, always computed.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
  pub project:          Project,
  pub status:           ProjectStatus,
  pub raised_amount:    Decimal,
  pub progress_percent: Decimal,
  pub can_cancel:       bool,
  pub is_funded:        bool,
  pub remaining:        String,
  pub rating:           RatingStats,
  pub as_of:            DateTime<Utc>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Project-scoped reads and writes that depend on the lifecycle rules.
#[derive(Clone)]
pub struct ProjectLifecycle<S> {
  store: Arc<S>,
}

impl<S: ProjectStore + DonationLedger> ProjectLifecycle<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn get(&self, project_id: Uuid) -> Result<Project> {
    self
      .store
      .get_project(project_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProjectNotFound(project_id))
  }

  /// Validate and persist a new project.
  pub async fn create(&self, draft: NewProject, now: DateTime<Utc>) -> Result<Project> {
    draft.validate(now)?;
    let project = self.store.create_project(draft).await.map_err(Error::store)?;
    tracing::info!(project_id = %project.project_id, "created project");
    Ok(project)
  }

  pub fn status(&self, project: &Project, now: DateTime<Utc>) -> ProjectStatus {
    compute_status(project.status, project.end_at, now)
  }

  pub async fn raised_amount(&self, project_id: Uuid) -> Result<Decimal> {
    self.store.sum_donations(project_id).await.map_err(Error::store)
  }

  pub async fn can_cancel(&self, project: &Project) -> Result<bool> {
    let raised = self.raised_amount(project.project_id).await?;
    Ok(can_cancel(raised, project.target_amount))
  }

  pub async fn is_funded(&self, project: &Project) -> Result<bool> {
    let raised = self.raised_amount(project.project_id).await?;
    Ok(is_funded(raised, project.target_amount))
  }

  pub fn remaining_time_label(&self, project: &Project, now: DateTime<Utc>) -> String {
    remaining_time_label(self.status(project, now), project.end_at, now)
  }

  pub async fn summarize(&self, project: Project, now: DateTime<Utc>) -> Result<ProjectSummary> {
    let raised = self.raised_amount(project.project_id).await?;
    let rating = self.rating_stats(project.project_id).await?;
    let status = self.status(&project, now);
    Ok(ProjectSummary {
      status,
      raised_amount: raised,
      progress_percent: progress_percent(raised, project.target_amount)?,
      can_cancel: can_cancel(raised, project.target_amount),
      is_funded: is_funded(raised, project.target_amount),
      remaining: remaining_time_label(status, project.end_at, now),
      rating,
      as_of: now,
      project,
    })
  }

  /// Cancel a project on behalf of `requester_id`.
  ///
  /// Only the creator may cancel, and only while [`can_cancel`] holds. The
  /// transition is direct from whatever the computed status is, and final.
  pub async fn cancel(&self, project_id: Uuid, requester_id: Uuid) -> Result<Project> {
    let project = self.get(project_id).await?;
    if project.creator_id != requester_id {
      return Err(Error::NotCreator);
    }
    match self.store.cancel_project(project_id).await.map_err(Error::store)? {
      CancelUpdate::Canceled(project) => {
        tracing::info!(%project_id, "canceled project");
        Ok(project)
      }
      CancelUpdate::AlreadyCanceled(project) => Ok(project),
      CancelUpdate::Refused => Err(Error::NotCancelable),
      CancelUpdate::ProjectMissing => Err(Error::ProjectNotFound(project_id)),
    }
  }

  /// Record a donation while the project is accepting them.
  pub async fn donate(
    &self,
    project_id: Uuid,
    donor_id: Uuid,
    amount: Decimal,
    now: DateTime<Utc>,
  ) -> Result<Donation> {
    validate_donation(amount)?;
    match self
      .store
      .record_donation(project_id, donor_id, amount, now)
      .await
      .map_err(Error::store)?
    {
      DonationInsert::Recorded(donation) => Ok(donation),
      DonationInsert::NotAccepting => Err(Error::NotAcceptingDonations),
      DonationInsert::ProjectMissing => Err(Error::ProjectNotFound(project_id)),
    }
  }

  /// Rate a project from 1 to 5. A second rating by the same principal
  /// replaces the first.
  pub async fn rate(
    &self,
    project_id: Uuid,
    rater_id: Uuid,
    value: u8,
    now: DateTime<Utc>,
  ) -> Result<Rating> {
    if !RATING_RANGE.contains(&value) {
      return Err(Error::InvalidInput(format!(
        "rating must be between {} and {}",
        RATING_RANGE.start(),
        RATING_RANGE.end()
      )));
    }
    let rating = Rating { project_id, rater_id, value, rated_at: now };
    self
      .store
      .rate_project(rating)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProjectNotFound(project_id))
  }

  pub async fn rating_stats(&self, project_id: Uuid) -> Result<RatingStats> {
    self.store.rating_stats(project_id).await.map_err(Error::store)
  }

  /// Post a comment, or a reply to a comment on the same project.
  pub async fn comment(&self, input: NewComment) -> Result<Comment> {
    if input.body.trim().is_empty() {
      return Err(Error::InvalidInput("comment must not be empty".into()));
    }
    self.get(input.project_id).await?;
    if let Some(parent_id) = input.parent_id {
      let parent = self
        .store
        .get_comment(parent_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::ContentNotFound)?;
      if parent.project_id != input.project_id {
        return Err(Error::InvalidInput(
          "reply must belong to the same project".into(),
        ));
      }
    }
    self.store.add_comment(input).await.map_err(Error::store)
  }
}
