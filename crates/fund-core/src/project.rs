//! Projects, donations, comments, and ratings.
//!
//! Only the fields that the lifecycle and moderation rules read are modelled
//! here. A project's raised amount is never stored: it is always obtained from
//! the donation ledger.
//!
//! Money is bounded on the way in. Targets hold at most twelve digits and
//! donations at most ten, both with two decimal places and a minimum of 1.00,
//! so sums and percentages over them stay far inside [`Decimal`]'s range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Smallest accepted target or donation.
pub const MIN_AMOUNT: Decimal = Decimal::ONE;

/// Largest accepted project target, 9 999 999 999.99.
pub const MAX_TARGET: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Largest accepted single donation, 99 999 999.99.
pub const MAX_DONATION: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Decimal places allowed on any amount.
pub const MONEY_SCALE: u32 = 2;

/// Accepted rating values, inclusive.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

fn check_money(field: &str, amount: Decimal, max: Decimal) -> Result<()> {
  if amount.normalize().scale() > MONEY_SCALE {
    return Err(Error::InvalidInput(format!(
      "{field} may have at most {MONEY_SCALE} decimal places"
    )));
  }
  if amount < MIN_AMOUNT || amount > max {
    return Err(Error::InvalidInput(format!(
      "{field} must be between {MIN_AMOUNT} and {max}"
    )));
  }
  Ok(())
}

/// Check a donation amount against the money bounds.
pub fn validate_donation(amount: Decimal) -> Result<()> {
  check_money("donation amount", amount, MAX_DONATION)
}

/// The stored status of a project.
///
/// Only [`ProjectStatus::Canceled`] is ever written after creation; the other
/// two are recomputed from the clock by
/// [`compute_status`](crate::lifecycle::compute_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
  Active,
  Canceled,
  Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub project_id:    Uuid,
  pub creator_id:    Uuid,
  pub title:         String,
  pub description:   String,
  pub status:        ProjectStatus,
  pub start_at:      DateTime<Utc>,
  pub end_at:        DateTime<Utc>,
  pub target_amount: Decimal,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`ProjectStore::create_project`](crate::store::ProjectStore::create_project).
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  #[serde(skip)]
  pub creator_id:    Uuid,
  pub title:         String,
  pub description:   String,
  pub start_at:      DateTime<Utc>,
  pub end_at:        DateTime<Utc>,
  pub target_amount: Decimal,
}

impl NewProject {
  /// Check the creation-time invariants.
  ///
  /// This is an explicit step for the caller to run before persisting; the
  /// store never re-validates on write.
  pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::InvalidInput("title must not be empty".into()));
    }
    if self.end_at <= self.start_at {
      return Err(Error::InvalidInput("end date must be after start date".into()));
    }
    if self.start_at <= now {
      return Err(Error::InvalidInput("start date must be in the future".into()));
    }
    check_money("target amount", self.target_amount, MAX_TARGET)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
  pub donation_id: Uuid,
  pub project_id:  Uuid,
  pub donor_id:    Uuid,
  pub amount:      Decimal,
  pub donated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub project_id: Uuid,
  pub author_id:  Uuid,
  /// Set when this comment is a reply. Removing the parent removes the reply.
  pub parent_id:  Option<Uuid>,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub project_id: Uuid,
  pub author_id:  Uuid,
  pub parent_id:  Option<Uuid>,
  pub body:       String,
}

/// One principal's 1 to 5 rating of a project. Rating again replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
  pub project_id: Uuid,
  pub rater_id:   Uuid,
  pub value:      u8,
  pub rated_at:   DateTime<Utc>,
}

/// Aggregate of a project's ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingStats {
  pub count:   u64,
  /// Mean value rounded to two places; `None` when unrated.
  pub average: Option<Decimal>,
}

impl RatingStats {
  pub fn from_total(count: u64, total: u64) -> Self {
    if count == 0 {
      return Self::default();
    }
    let average = (Decimal::from(total) / Decimal::from(count)).round_dp(2);
    Self { count, average: Some(average) }
  }
}

/// Result of [`ProjectStore::record_donation`](crate::store::ProjectStore::record_donation).
#[derive(Debug, Clone)]
pub enum DonationInsert {
  Recorded(Donation),
  /// The computed status was not `Active`; nothing was written.
  NotAccepting,
  ProjectMissing,
}

/// Result of [`ProjectStore::cancel_project`](crate::store::ProjectStore::cancel_project).
#[derive(Debug, Clone)]
pub enum CancelUpdate {
  Canceled(Project),
  AlreadyCanceled(Project),
  /// The project had raised too much; nothing was written.
  Refused,
  ProjectMissing,
}
