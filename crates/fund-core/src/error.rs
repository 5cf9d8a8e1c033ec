//! Error types for `fund-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::principal::PrivilegeClass;

/// User-facing message for any token lookup failure.
pub const INVALID_LINK_MESSAGE: &str = "invalid or expired link";

/// User-facing message for any credential failure other than an inactive
/// account.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";

/// User-facing message for a correct login against an unactivated account.
pub const INACTIVE_MESSAGE: &str =
  "your account is not active; check your email for the activation link";

#[derive(Debug, Error)]
pub enum Error {
  /// No live token matches the presented identifier.
  #[error("token not found")]
  NotFound,

  /// The token existed but its TTL had elapsed; it has been deleted.
  #[error("token expired")]
  Expired,

  #[error("content already reported by this principal")]
  AlreadyReported,

  #[error("principal does not hold the required privilege class")]
  WrongPrivilegeClass,

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("principal is not active")]
  Inactive,

  /// A caller tried to store a principal in the slot of the other privilege
  /// class. This is a programming error in the caller.
  #[error("contract violation: {class:?} principal {principal_id} offered to the {slot} slot")]
  ContractViolation {
    principal_id: Uuid,
    class:        PrivilegeClass,
    slot:         &'static str,
  },

  #[error("principal not found: {0}")]
  PrincipalNotFound(Uuid),

  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("content not found")]
  ContentNotFound,

  #[error("only the creator may cancel this project")]
  NotCreator,

  #[error("project has raised too much to be canceled")]
  NotCancelable,

  #[error("project is not accepting donations")]
  NotAcceptingDonations,

  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Money arithmetic left the representable range.
  #[error("amount arithmetic overflowed")]
  AmountOverflow,

  #[error("password hashing error: {0}")]
  PasswordHash(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// The message that may be shown to the end user.
  ///
  /// Token failures collapse to one message, and credential failures other
  /// than [`Error::Inactive`] collapse to another, so neither path can be used
  /// to enumerate tokens or accounts.
  pub fn public_message(&self) -> String {
    match self {
      Self::NotFound | Self::Expired => INVALID_LINK_MESSAGE.to_owned(),
      Self::InvalidCredentials | Self::WrongPrivilegeClass => {
        INVALID_CREDENTIALS_MESSAGE.to_owned()
      }
      Self::Inactive => INACTIVE_MESSAGE.to_owned(),
      Self::ContractViolation { .. }
      | Self::AmountOverflow
      | Self::PasswordHash(_)
      | Self::Store(_) => "internal error".to_owned(),
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
