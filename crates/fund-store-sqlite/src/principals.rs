//! [`PrincipalStore`] for [`SqliteStore`].

use chrono::Utc;
use fund_core::{
  principal::{NewPrincipal, Principal},
  store::PrincipalStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawPrincipal, encode_dt, encode_uuid},
};

impl SqliteStore {
  async fn principal_where(&self, column: &'static str, value: String) -> Result<Option<Principal>> {
    let raw: Option<RawPrincipal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM principals WHERE {column} = ?1",
                RawPrincipal::COLUMNS
              ),
              rusqlite::params![value],
              RawPrincipal::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPrincipal::into_principal).transpose()
  }
}

impl PrincipalStore for SqliteStore {
  async fn find_by_email(&self, email: String) -> Result<Option<Principal>> {
    self.principal_where("email", email).await
  }

  async fn get_principal(&self, principal_id: Uuid) -> Result<Option<Principal>> {
    self.principal_where("principal_id", encode_uuid(principal_id)).await
  }

  async fn create_principal(&self, input: NewPrincipal) -> Result<Option<Principal>> {
    let principal = Principal {
      principal_id:  Uuid::new_v4(),
      email:         input.email,
      first_name:    input.first_name,
      last_name:     input.last_name,
      password_hash: input.password_hash,
      is_staff:      input.is_staff,
      is_superuser:  input.is_superuser,
      is_active:     input.is_active,
      created_at:    Utc::now(),
    };

    let id_str     = encode_uuid(principal.principal_id);
    let email      = principal.email.clone();
    let first_name = principal.first_name.clone();
    let last_name  = principal.last_name.clone();
    let hash       = principal.password_hash.clone();
    let flags      = (principal.is_staff, principal.is_superuser, principal.is_active);
    let at_str     = encode_dt(principal.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO principals (
             principal_id, email, first_name, last_name, password_hash,
             is_staff, is_superuser, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![
            id_str, email, first_name, last_name, hash,
            flags.0, flags.1, flags.2, at_str,
          ],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(principal))
  }

  async fn activate_principal(&self, principal_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(principal_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE principals SET is_active = 1 WHERE principal_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn set_password_hash(&self, principal_id: Uuid, password_hash: String) -> Result<bool> {
    let id_str = encode_uuid(principal_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE principals SET password_hash = ?2 WHERE principal_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn delete_principal(&self, principal_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(principal_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM principals WHERE principal_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }
}
