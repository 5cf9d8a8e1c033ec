//! [`ProjectStore`] and [`DonationLedger`] for [`SqliteStore`].
//!
//! Cancellation and donation read the project and write in one transaction,
//! so the lifecycle rule they check still holds when the write lands.

use chrono::{DateTime, Utc};
use fund_core::{
  lifecycle::{can_cancel, compute_status},
  project::{
    CancelUpdate, Comment, Donation, DonationInsert, NewComment, NewProject, Project,
    ProjectStatus, Rating, RatingStats,
  },
  store::{DonationLedger, ProjectStore},
};
use rusqlite::OptionalExtension as _;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    DonationRow, RawComment, RawProject, decode_decimal, decode_dt, decode_project_status,
    encode_decimal, encode_dt, encode_project_status, encode_uuid, in_call,
  },
};

/// Exact sum of a project's donations; `None` if it leaves `Decimal`'s range.
///
/// Amounts are decimal strings; summing in SQL would go through floats.
fn sum_amounts(
  conn: &rusqlite::Connection,
  project_id: &str,
) -> tokio_rusqlite::Result<Option<Decimal>> {
  let mut stmt = conn.prepare("SELECT amount FROM donations WHERE project_id = ?1")?;
  let amounts = stmt
    .query_map(rusqlite::params![project_id], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  let mut total = Decimal::ZERO;
  for amount in &amounts {
    match total.checked_add(in_call(decode_decimal(amount))?) {
      Some(sum) => total = sum,
      None => return Ok(None),
    }
  }
  Ok(Some(total))
}

impl ProjectStore for SqliteStore {
  async fn create_project(&self, input: NewProject) -> Result<Project> {
    let project = Project {
      project_id:    Uuid::new_v4(),
      creator_id:    input.creator_id,
      title:         input.title,
      description:   input.description,
      status:        ProjectStatus::Active,
      start_at:      input.start_at,
      end_at:        input.end_at,
      target_amount: input.target_amount,
      created_at:    Utc::now(),
    };

    let id_str      = encode_uuid(project.project_id);
    let creator_str = encode_uuid(project.creator_id);
    let title       = project.title.clone();
    let description = project.description.clone();
    let status      = encode_project_status(project.status);
    let start_str   = encode_dt(project.start_at);
    let end_str     = encode_dt(project.end_at);
    let target_str  = encode_decimal(project.target_amount);
    let at_str      = encode_dt(project.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (
             project_id, creator_id, title, description, status,
             start_at, end_at, target_amount, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, creator_str, title, description, status,
            start_str, end_str, target_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>> {
    let id_str = encode_uuid(project_id);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM projects WHERE project_id = ?1",
                RawProject::COLUMNS
              ),
              rusqlite::params![id_str],
              RawProject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn cancel_project(&self, project_id: Uuid) -> Result<CancelUpdate> {
    let id_str   = encode_uuid(project_id);
    let canceled = encode_project_status(ProjectStatus::Canceled);

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let raw = tx
            .query_row(
              &format!(
                "SELECT {} FROM projects WHERE project_id = ?1",
                RawProject::COLUMNS
              ),
              rusqlite::params![id_str],
              RawProject::from_row,
            )
            .optional()?;
          let Some(raw) = raw else {
            return Ok(CancelUpdate::ProjectMissing);
          };
          let mut project = in_call(raw.into_project())?;
          if project.status == ProjectStatus::Canceled {
            return Ok(CancelUpdate::AlreadyCanceled(project));
          }

          let raised = sum_amounts(&tx, &id_str)?;
          if !raised.is_some_and(|raised| can_cancel(raised, project.target_amount)) {
            return Ok(CancelUpdate::Refused);
          }
          tx.execute(
            "UPDATE projects SET status = ?2 WHERE project_id = ?1",
            rusqlite::params![id_str, canceled],
          )?;
          tx.commit()?;

          project.status = ProjectStatus::Canceled;
          Ok(CancelUpdate::Canceled(project))
        })
        .await?,
    )
  }

  async fn record_donation(
    &self,
    project_id: Uuid,
    donor_id: Uuid,
    amount: Decimal,
    now: DateTime<Utc>,
  ) -> Result<DonationInsert> {
    let donation = Donation {
      donation_id: Uuid::new_v4(),
      project_id,
      donor_id,
      amount,
      donated_at: now,
    };
    let row = DonationRow::from(&donation);

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let state: Option<(String, String)> = tx
            .query_row(
              "SELECT status, end_at FROM projects WHERE project_id = ?1",
              rusqlite::params![row.project_id],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
          let Some((status, end_at)) = state else {
            return Ok(DonationInsert::ProjectMissing);
          };
          let status = in_call(decode_project_status(&status))?;
          let end_at = in_call(decode_dt(&end_at))?;
          if compute_status(status, end_at, now) != ProjectStatus::Active {
            return Ok(DonationInsert::NotAccepting);
          }

          tx.execute(
            "INSERT INTO donations (donation_id, project_id, donor_id, amount, donated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              row.donation_id, row.project_id, row.donor_id, row.amount, row.donated_at,
            ],
          )?;
          tx.commit()?;
          Ok(DonationInsert::Recorded(donation))
        })
        .await?,
    )
  }

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      project_id: input.project_id,
      author_id:  input.author_id,
      parent_id:  input.parent_id,
      body:       input.body,
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(comment.comment_id);
    let project_str = encode_uuid(comment.project_id);
    let author_str  = encode_uuid(comment.author_id);
    let parent_str  = comment.parent_id.map(encode_uuid);
    let body        = comment.body.clone();
    let at_str      = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, project_id, author_id, parent_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, project_str, author_str, parent_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(comment_id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM comments WHERE comment_id = ?1",
                RawComment::COLUMNS
              ),
              rusqlite::params![id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn rate_project(&self, rating: Rating) -> Result<Option<Rating>> {
    let project_str = encode_uuid(rating.project_id);
    let rater_str   = encode_uuid(rating.rater_id);
    let value       = rating.value;
    let at_str      = encode_dt(rating.rated_at);

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM projects WHERE project_id = ?1)",
          rusqlite::params![project_str],
          |row| row.get(0),
        )?;
        if !exists {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO ratings (project_id, rater_id, value, rated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (project_id, rater_id)
           DO UPDATE SET value = excluded.value, rated_at = excluded.rated_at",
          rusqlite::params![project_str, rater_str, value, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(stored.then_some(rating))
  }

  async fn rating_stats(&self, project_id: Uuid) -> Result<RatingStats> {
    let id_str = encode_uuid(project_id);

    let (count, total): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(value), 0) FROM ratings WHERE project_id = ?1",
          rusqlite::params![id_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(RatingStats::from_total(
      u64::try_from(count).unwrap_or_default(),
      u64::try_from(total).unwrap_or_default(),
    ))
  }
}

impl DonationLedger for SqliteStore {
  async fn sum_donations(&self, project_id: Uuid) -> Result<Decimal> {
    let id_str = encode_uuid(project_id);

    self
      .conn
      .call(move |conn| sum_amounts(conn, &id_str))
      .await?
      .ok_or(Error::SumOverflow(project_id))
  }
}
