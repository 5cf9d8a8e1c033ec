//! [`ReportLedger`] for [`SqliteStore`].

use chrono::Utc;
use fund_core::{
  moderation::{ContentRef, NewReport, ReportInsert},
  store::ReportLedger,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{encode_dt, encode_uuid},
};

/// Table and column names for one kind of reportable content.
struct Target {
  content_table: &'static str,
  report_table:  &'static str,
  id_column:     &'static str,
  id:            String,
}

impl From<ContentRef> for Target {
  fn from(content: ContentRef) -> Self {
    match content {
      ContentRef::Project(id) => Self {
        content_table: "projects",
        report_table:  "project_reports",
        id_column:     "project_id",
        id:            encode_uuid(id),
      },
      ContentRef::Comment(id) => Self {
        content_table: "comments",
        report_table:  "comment_reports",
        id_column:     "comment_id",
        id:            encode_uuid(id),
      },
    }
  }
}

impl ReportLedger for SqliteStore {
  async fn report_exists(&self, reporter_id: Uuid, content: ContentRef) -> Result<bool> {
    let target   = Target::from(content);
    let reporter = encode_uuid(reporter_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          let found: i64 = conn.query_row(
            &format!(
              "SELECT EXISTS (SELECT 1 FROM {} WHERE reporter_id = ?1 AND {} = ?2)",
              target.report_table, target.id_column
            ),
            rusqlite::params![reporter, target.id],
            |row| row.get(0),
          )?;
          Ok(found != 0)
        })
        .await?,
    )
  }

  async fn record_report(&self, report: NewReport) -> Result<ReportInsert> {
    let target    = Target::from(report.content);
    let report_id = encode_uuid(Uuid::new_v4());
    let reporter  = encode_uuid(report.reporter_id);
    let reason    = report.reason;
    let at_str    = encode_dt(Utc::now());

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let exists: i64 = tx.query_row(
            &format!(
              "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = ?1)",
              target.content_table, target.id_column
            ),
            rusqlite::params![target.id],
            |row| row.get(0),
          )?;
          if exists == 0 {
            return Ok(ReportInsert::ContentMissing);
          }
          let inserted = tx.execute(
            &format!(
              "INSERT INTO {} (report_id, {}, reporter_id, reason, reported_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (reporter_id, {}) DO NOTHING",
              target.report_table, target.id_column, target.id_column
            ),
            rusqlite::params![report_id, target.id, reporter, reason, at_str],
          )?;
          tx.commit()?;
          Ok(if inserted > 0 { ReportInsert::Recorded } else { ReportInsert::Duplicate })
        })
        .await?,
    )
  }

  async fn count_reports(&self, content: ContentRef) -> Result<u64> {
    let target = Target::from(content);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            target.report_table, target.id_column
          ),
          rusqlite::params![target.id],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn remove_content(&self, content: ContentRef) -> Result<bool> {
    let target = Target::from(content);

    // Foreign-key cascades take the reports, replies, and donations with it.
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "DELETE FROM {} WHERE {} = ?1",
            target.content_table, target.id_column
          ),
          rusqlite::params![target.id],
        )?)
      })
      .await?;
    Ok(n > 0)
  }
}
