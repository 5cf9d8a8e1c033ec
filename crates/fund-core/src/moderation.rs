//! Threshold-triggered moderation.
//!
//! Each principal may report a given piece of content once. When the number
//! of reports reaches [`REMOVAL_THRESHOLD`] the content is removed, along with
//! its dependents, in the same logical operation as the report that tipped it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::ReportLedger};

/// Report count at which content is removed.
pub const REMOVAL_THRESHOLD: u64 = 2;

/// A reportable piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ContentRef {
  Project(Uuid),
  Comment(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewReport {
  pub reporter_id: Uuid,
  pub content:     ContentRef,
  pub reason:      String,
}

/// What the ledger did with a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportInsert {
  Recorded,
  /// The `(reporter, content)` pair already existed; nothing was written.
  Duplicate,
  /// The content does not exist (or was already removed).
  ContentMissing,
}

/// Result of a report submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
  /// True only if this submission's check removed the content.
  pub removed: bool,
}

#[derive(Clone)]
pub struct ModerationGate<S> {
  store: Arc<S>,
}

impl<S: ReportLedger> ModerationGate<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Record a report by `reporter_id` against `content`.
  pub async fn report(
    &self,
    reporter_id: Uuid,
    content: ContentRef,
    reason: impl Into<String>,
  ) -> Result<()> {
    let reason = reason.into();
    if reason.trim().is_empty() {
      return Err(Error::InvalidInput("a reason for the report is required".into()));
    }
    let inserted = self
      .store
      .record_report(NewReport { reporter_id, content, reason })
      .await
      .map_err(Error::store)?;
    match inserted {
      ReportInsert::Recorded => Ok(()),
      ReportInsert::Duplicate => Err(Error::AlreadyReported),
      ReportInsert::ContentMissing => Err(Error::ContentNotFound),
    }
  }

  /// Remove `content` if its report count has reached the threshold.
  ///
  /// Idempotent: once the content is gone this returns `false`. Of several
  /// concurrent callers, only the one whose delete took effect sees `true`.
  pub async fn check_and_maybe_remove(&self, content: ContentRef) -> Result<bool> {
    let count = self.store.count_reports(content).await.map_err(Error::store)?;
    if count < REMOVAL_THRESHOLD {
      return Ok(false);
    }
    let removed = self.store.remove_content(content).await.map_err(Error::store)?;
    if removed {
      tracing::info!(?content, count, "removed reported content");
    }
    Ok(removed)
  }

  /// Report and immediately run the removal check, as one unit.
  pub async fn submit(
    &self,
    reporter_id: Uuid,
    content: ContentRef,
    reason: impl Into<String>,
  ) -> Result<ReportOutcome> {
    self.report(reporter_id, content, reason).await?;
    let removed = self.check_and_maybe_remove(content).await?;
    Ok(ReportOutcome { removed })
  }

  pub async fn has_reported(&self, reporter_id: Uuid, content: ContentRef) -> Result<bool> {
    self
      .store
      .report_exists(reporter_id, content)
      .await
      .map_err(Error::store)
  }

  pub async fn report_count(&self, content: ContentRef) -> Result<u64> {
    self.store.count_reports(content).await.map_err(Error::store)
  }
}
