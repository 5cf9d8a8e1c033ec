//! [`TokenRepository`] for [`SqliteStore`].

use chrono::{DateTime, Utc};
use fund_core::{
  store::TokenRepository,
  token::{TokenDigest, TokenKind, TokenRecord},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawToken, encode_dt, encode_token_kind, encode_uuid},
};

impl TokenRepository for SqliteStore {
  async fn replace_token(&self, record: TokenRecord) -> Result<()> {
    let digest    = record.digest.as_str().to_owned();
    let kind      = encode_token_kind(record.kind);
    let owner_id  = encode_uuid(record.owner_id);
    let issued_at = encode_dt(record.issued_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM tokens WHERE owner_id = ?1 AND kind = ?2",
          rusqlite::params![owner_id, kind],
        )?;
        tx.execute(
          "INSERT INTO tokens (token_digest, kind, owner_id, issued_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![digest, kind, owner_id, issued_at],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_token(&self, kind: TokenKind, digest: TokenDigest) -> Result<Option<TokenRecord>> {
    let kind   = encode_token_kind(kind);
    let digest = digest.as_str().to_owned();

    let raw: Option<RawToken> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM tokens WHERE token_digest = ?1 AND kind = ?2",
                RawToken::COLUMNS
              ),
              rusqlite::params![digest, kind],
              RawToken::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawToken::into_record).transpose()
  }

  async fn take_token(&self, kind: TokenKind, digest: TokenDigest) -> Result<Option<TokenRecord>> {
    let kind   = encode_token_kind(kind);
    let digest = digest.as_str().to_owned();

    let raw: Option<RawToken> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!(
              "SELECT {} FROM tokens WHERE token_digest = ?1 AND kind = ?2",
              RawToken::COLUMNS
            ),
            rusqlite::params![digest, kind],
            RawToken::from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM tokens WHERE token_digest = ?1",
            rusqlite::params![digest],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawToken::into_record).transpose()
  }

  async fn delete_token(&self, kind: TokenKind, digest: TokenDigest) -> Result<bool> {
    let kind   = encode_token_kind(kind);
    let digest = digest.as_str().to_owned();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tokens WHERE token_digest = ?1 AND kind = ?2",
          rusqlite::params![digest, kind],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn delete_expired(&self, kind: TokenKind, cutoff: DateTime<Utc>) -> Result<usize> {
    let kind   = encode_token_kind(kind);
    let cutoff = encode_dt(cutoff);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM tokens WHERE kind = ?1 AND issued_at < ?2",
            rusqlite::params![kind, cutoff],
          )?)
        })
        .await?,
    )
  }

  async fn delete_tokens_for_owner(&self, owner_id: Uuid) -> Result<usize> {
    let owner_id = encode_uuid(owner_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM tokens WHERE owner_id = ?1",
            rusqlite::params![owner_id],
          )?)
        })
        .await?,
    )
  }

  async fn delete_all_tokens(&self) -> Result<usize> {
    Ok(
      self
        .conn
        .call(|conn| Ok(conn.execute("DELETE FROM tokens", [])?))
        .await?,
    )
  }
}
