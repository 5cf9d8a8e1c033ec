//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nanosecond
//! width, so lexicographic order in SQL matches chronological order. Money is
//! stored as decimal strings, never as floats. UUIDs are stored as hyphenated
//! lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use fund_core::{
  principal::Principal,
  project::{Comment, Donation, Project, ProjectStatus},
  token::{TokenDigest, TokenKind, TokenRecord},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Carry a decode failure out of a `Connection::call` closure.
pub fn in_call<T>(decoded: Result<T>) -> tokio_rusqlite::Result<T> {
  decoded.map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_token_kind(k: TokenKind) -> &'static str {
  match k {
    TokenKind::Activation => "activation",
    TokenKind::PasswordReset => "password_reset",
  }
}

pub fn decode_token_kind(s: &str) -> Result<TokenKind> {
  match s {
    "activation" => Ok(TokenKind::Activation),
    "password_reset" => Ok(TokenKind::PasswordReset),
    other => Err(Error::UnknownDiscriminant { column: "tokens.kind", value: other.to_owned() }),
  }
}

pub fn encode_project_status(s: ProjectStatus) -> &'static str {
  match s {
    ProjectStatus::Active => "active",
    ProjectStatus::Canceled => "canceled",
    ProjectStatus::Completed => "completed",
  }
}

pub fn decode_project_status(s: &str) -> Result<ProjectStatus> {
  match s {
    "active" => Ok(ProjectStatus::Active),
    "canceled" => Ok(ProjectStatus::Canceled),
    "completed" => Ok(ProjectStatus::Completed),
    other => Err(Error::UnknownDiscriminant { column: "projects.status", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `tokens` row.
pub struct RawToken {
  pub token_digest: String,
  pub kind:         String,
  pub owner_id:     String,
  pub issued_at:    String,
}

impl RawToken {
  pub const COLUMNS: &'static str = "token_digest, kind, owner_id, issued_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      token_digest: row.get(0)?,
      kind:         row.get(1)?,
      owner_id:     row.get(2)?,
      issued_at:    row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<TokenRecord> {
    Ok(TokenRecord {
      digest:    TokenDigest::from_hex(self.token_digest),
      owner_id:  decode_uuid(&self.owner_id)?,
      kind:      decode_token_kind(&self.kind)?,
      issued_at: decode_dt(&self.issued_at)?,
    })
  }
}

/// Raw values read directly from a `principals` row.
pub struct RawPrincipal {
  pub principal_id:  String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
  pub is_staff:      bool,
  pub is_superuser:  bool,
  pub is_active:     bool,
  pub created_at:    String,
}

impl RawPrincipal {
  pub const COLUMNS: &'static str = "principal_id, email, first_name, last_name, \
     password_hash, is_staff, is_superuser, is_active, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      principal_id:  row.get(0)?,
      email:         row.get(1)?,
      first_name:    row.get(2)?,
      last_name:     row.get(3)?,
      password_hash: row.get(4)?,
      is_staff:      row.get(5)?,
      is_superuser:  row.get(6)?,
      is_active:     row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_principal(self) -> Result<Principal> {
    Ok(Principal {
      principal_id:  decode_uuid(&self.principal_id)?,
      email:         self.email,
      first_name:    self.first_name,
      last_name:     self.last_name,
      password_hash: self.password_hash,
      is_staff:      self.is_staff,
      is_superuser:  self.is_superuser,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `projects` row.
pub struct RawProject {
  pub project_id:    String,
  pub creator_id:    String,
  pub title:         String,
  pub description:   String,
  pub status:        String,
  pub start_at:      String,
  pub end_at:        String,
  pub target_amount: String,
  pub created_at:    String,
}

impl RawProject {
  pub const COLUMNS: &'static str = "project_id, creator_id, title, description, \
     status, start_at, end_at, target_amount, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:    row.get(0)?,
      creator_id:    row.get(1)?,
      title:         row.get(2)?,
      description:   row.get(3)?,
      status:        row.get(4)?,
      start_at:      row.get(5)?,
      end_at:        row.get(6)?,
      target_amount: row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:    decode_uuid(&self.project_id)?,
      creator_id:    decode_uuid(&self.creator_id)?,
      title:         self.title,
      description:   self.description,
      status:        decode_project_status(&self.status)?,
      start_at:      decode_dt(&self.start_at)?,
      end_at:        decode_dt(&self.end_at)?,
      target_amount: decode_decimal(&self.target_amount)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub comment_id: String,
  pub project_id: String,
  pub author_id:  String,
  pub parent_id:  Option<String>,
  pub body:       String,
  pub created_at: String,
}

impl RawComment {
  pub const COLUMNS: &'static str =
    "comment_id, project_id, author_id, parent_id, body, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      project_id: row.get(1)?,
      author_id:  row.get(2)?,
      parent_id:  row.get(3)?,
      body:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      project_id: decode_uuid(&self.project_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      parent_id:  self.parent_id.as_deref().map(decode_uuid).transpose()?,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Encoded column values for a new `donations` row.
pub struct DonationRow {
  pub donation_id: String,
  pub project_id:  String,
  pub donor_id:    String,
  pub amount:      String,
  pub donated_at:  String,
}

impl From<&Donation> for DonationRow {
  fn from(d: &Donation) -> Self {
    Self {
      donation_id: encode_uuid(d.donation_id),
      project_id:  encode_uuid(d.project_id),
      donor_id:    encode_uuid(d.donor_id),
      amount:      encode_decimal(d.amount),
      donated_at:  encode_dt(d.donated_at),
    }
  }
}
