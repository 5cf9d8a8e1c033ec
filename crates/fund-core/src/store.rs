//! Storage traits consumed by the core services.
//!
//! The traits are implemented by storage backends (e.g. `fund-store-sqlite`).
//! The services in this crate and the web layer depend on these abstractions,
//! not on any concrete backend.
//!
//! Every trait shares the error type of [`Storage`], so a single backend can
//! implement all of them and be named through [`Backend`].
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  moderation::{ContentRef, NewReport, ReportInsert},
  principal::{NewPrincipal, Principal},
  project::{
    CancelUpdate, Comment, DonationInsert, NewComment, NewProject, Project, Rating,
    RatingStats,
  },
  session::SessionHandle,
  token::{TokenDigest, TokenKind, TokenRecord},
};

/// Base trait carrying the backend's error type.
pub trait Storage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub trait TokenRepository: Storage {
  /// Delete every token of `record.kind` owned by `record.owner_id`, then
  /// insert `record`. The two steps must be atomic: no reader may ever observe
  /// two tokens of the same kind for one owner.
  fn replace_token(
    &self,
    record: TokenRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up a token without consuming it.
  fn find_token(
    &self,
    kind: TokenKind,
    digest: TokenDigest,
  ) -> impl Future<Output = Result<Option<TokenRecord>, Self::Error>> + Send + '_;

  /// Atomically look up and delete a token. Of several concurrent callers
  /// presenting the same digest, at most one receives `Some`.
  fn take_token(
    &self,
    kind: TokenKind,
    digest: TokenDigest,
  ) -> impl Future<Output = Result<Option<TokenRecord>, Self::Error>> + Send + '_;

  /// Delete one token. Returns `false` if it was already gone.
  fn delete_token(
    &self,
    kind: TokenKind,
    digest: TokenDigest,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every token of `kind` issued strictly before `cutoff`.
  fn delete_expired(
    &self,
    kind: TokenKind,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete every token, of any kind, owned by `owner_id`.
  fn delete_tokens_for_owner(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn delete_all_tokens(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// A key-value store scoped by session handle.
///
/// Writes to the same key are last-write-wins. Operations on one key never
/// read or touch any other key. Every write stamps the value with the current
/// time; values stamped before a reader's cutoff are absent to that reader.
pub trait SessionStore: Storage {
  /// The value under `key`, unless it was written before `written_after`.
  fn get_value(
    &self,
    session: SessionHandle,
    key: &'static str,
    written_after: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn put_value(
    &self,
    session: SessionHandle,
    key: &'static str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn remove_value(
    &self,
    session: SessionHandle,
    key: &'static str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every value, in any session, written before `cutoff`.
  fn purge_values(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Principals ──────────────────────────────────────────────────────────────

pub trait PrincipalStore: Storage {
  /// Look up a principal by (normalised) email address.
  fn find_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  fn get_principal(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Persist a new principal. Returns `None` if the email is already taken.
  fn create_principal(
    &self,
    input: NewPrincipal,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Mark a principal active. Returns `false` if no such principal exists.
  fn activate_principal(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    principal_id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a principal and, transitively, everything it owns.
  fn delete_principal(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Projects ────────────────────────────────────────────────────────────────

pub trait ProjectStore: Storage {
  /// Persist a project with status `Active`. Validation is the caller's job.
  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Write the terminal `Canceled` status if
  /// [`can_cancel`](crate::lifecycle::can_cancel) holds for the project's
  /// raised amount. The read and the write form one atomic step, so no
  /// donation can land between them.
  fn cancel_project(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<CancelUpdate, Self::Error>> + Send + '_;

  /// Record a donation if the project's
  /// [computed status](crate::lifecycle::compute_status) at `now` is
  /// `Active`, atomically with that check. Amount bounds are the caller's job.
  fn record_donation(
    &self,
    project_id: Uuid,
    donor_id: Uuid,
    amount: Decimal,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<DonationInsert, Self::Error>> + Send + '_;

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Insert or replace `rating`; one per `(project, rater)`. Returns `None` if
  /// the project does not exist.
  fn rate_project(
    &self,
    rating: Rating,
  ) -> impl Future<Output = Result<Option<Rating>, Self::Error>> + Send + '_;

  fn rating_stats(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<RatingStats, Self::Error>> + Send + '_;
}

/// The donation ledger: the only source of a project's raised amount.
pub trait DonationLedger: Storage {
  /// Sum of all donations to `project_id`; zero if there are none. A sum
  /// outside [`Decimal`]'s range is an error, never a panic.
  fn sum_donations(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Decimal, Self::Error>> + Send + '_;
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub trait ReportLedger: Storage {
  fn report_exists(
    &self,
    reporter_id: Uuid,
    content: ContentRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record a report. Uniqueness of `(reporter, content)` must be enforced by
  /// the store itself, not by a prior existence check.
  fn record_report(
    &self,
    report: NewReport,
  ) -> impl Future<Output = Result<ReportInsert, Self::Error>> + Send + '_;

  fn count_reports(
    &self,
    content: ContentRef,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Delete the content and its dependents. Returns `true` only for the call
  /// that actually removed it; deleting already-removed content is `false`.
  fn remove_content(
    &self,
    content: ContentRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Everything ──────────────────────────────────────────────────────────────

/// A backend implementing every storage trait.
pub trait Backend:
  TokenRepository
  + SessionStore
  + PrincipalStore
  + ProjectStore
  + DonationLedger
  + ReportLedger
  + Clone
  + 'static
{
}

impl<T> Backend for T where
  T: TokenRepository
    + SessionStore
    + PrincipalStore
    + ProjectStore
    + DonationLedger
    + ReportLedger
    + Clone
    + 'static
{
}
