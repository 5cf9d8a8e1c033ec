//! Principals: the identities that can authenticate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which slot a principal is allowed to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeClass {
  /// Neither staff nor superuser. May only hold the User slot.
  Ordinary,
  /// Staff or superuser. May only hold the Admin slot.
  Elevated,
}

/// A registered identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
  pub principal_id:  Uuid,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_staff:      bool,
  pub is_superuser:  bool,
  /// False until the activation link has been followed.
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

impl Principal {
  pub fn privilege_class(&self) -> PrivilegeClass {
    if self.is_staff || self.is_superuser {
      PrivilegeClass::Elevated
    } else {
      PrivilegeClass::Ordinary
    }
  }
}

/// Input for [`PrincipalStore::create_principal`](crate::store::PrincipalStore::create_principal).
#[derive(Debug, Clone)]
pub struct NewPrincipal {
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
  pub is_staff:      bool,
  pub is_superuser:  bool,
  pub is_active:     bool,
}

impl NewPrincipal {
  /// An ordinary account, inactive until activation.
  pub fn ordinary(
    email: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    password_hash: String,
  ) -> Self {
    Self {
      email: normalize_email(&email.into()),
      first_name: first_name.into(),
      last_name: last_name.into(),
      password_hash,
      is_staff: false,
      is_superuser: false,
      is_active: false,
    }
  }

  /// A superuser account; active immediately.
  pub fn superuser(
    email: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    password_hash: String,
  ) -> Self {
    Self {
      email: normalize_email(&email.into()),
      first_name: first_name.into(),
      last_name: last_name.into(),
      password_hash,
      is_staff: true,
      is_superuser: true,
      is_active: true,
    }
  }
}

/// Lowercase the domain part of an address, leaving the local part intact.
pub fn normalize_email(email: &str) -> String {
  let email = email.trim();
  match email.rsplit_once('@') {
    Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
    None => email.to_owned(),
  }
}
