//! [`SessionStore`] for [`SqliteStore`].

use chrono::{DateTime, Utc};
use fund_core::{session::SessionHandle, store::SessionStore};
use rusqlite::OptionalExtension as _;

use crate::{Result, SqliteStore, encode::encode_dt};

impl SessionStore for SqliteStore {
  async fn get_value(
    &self,
    session: SessionHandle,
    key: &'static str,
    written_after: DateTime<Utc>,
  ) -> Result<Option<String>> {
    let session_key = session.as_str().to_owned();
    let cutoff      = encode_dt(written_after);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT value FROM session_values
                 WHERE session_key = ?1 AND value_key = ?2 AND written_at >= ?3",
                rusqlite::params![session_key, key, cutoff],
                |row| row.get(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn put_value(&self, session: SessionHandle, key: &'static str, value: String) -> Result<()> {
    let session_key = session.as_str().to_owned();
    let written_at  = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO session_values (session_key, value_key, value, written_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (session_key, value_key)
           DO UPDATE SET value = excluded.value, written_at = excluded.written_at",
          rusqlite::params![session_key, key, value, written_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_value(&self, session: SessionHandle, key: &'static str) -> Result<()> {
    let session_key = session.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM session_values WHERE session_key = ?1 AND value_key = ?2",
          rusqlite::params![session_key, key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn purge_values(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff = encode_dt(cutoff);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM session_values WHERE written_at < ?1",
            rusqlite::params![cutoff],
          )?)
        })
        .await?,
    )
  }
}
