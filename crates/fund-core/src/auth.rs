//! Credential authentication, parameterised by privilege class.
//!
//! The same [`Authenticator`] type is instantiated once for ordinary users and
//! once for administrators. The two instances share no mutable state.

use std::sync::Arc;

use crate::{
  Error, Result,
  password::{DUMMY_HASH, verify_secret},
  principal::{Principal, PrivilegeClass, normalize_email},
  session::{IdentitySession, SessionHandle, Slot},
  store::{PrincipalStore, SessionStore},
};

#[derive(Clone)]
pub struct Authenticator<S> {
  store: Arc<S>,
  class: PrivilegeClass,
}

impl<S: PrincipalStore> Authenticator<S> {
  pub fn new(store: Arc<S>, class: PrivilegeClass) -> Self { Self { store, class } }

  /// Authenticator for the User slot.
  pub fn ordinary(store: Arc<S>) -> Self { Self::new(store, PrivilegeClass::Ordinary) }

  /// Authenticator for the Admin slot.
  pub fn elevated(store: Arc<S>) -> Self { Self::new(store, PrivilegeClass::Elevated) }

  pub fn class(&self) -> PrivilegeClass { self.class }

  /// The slot a successful authentication may populate.
  pub fn slot(&self) -> Slot { Slot::for_class(self.class) }

  /// Check credentials in order: lookup, secret, privilege class, active flag.
  pub async fn authenticate(&self, email: &str, password: &str) -> Result<Principal> {
    let found = self
      .store
      .find_by_email(normalize_email(email))
      .await
      .map_err(Error::store)?;
    let Some(principal) = found else {
      verify_secret(DUMMY_HASH, password);
      return Err(Error::InvalidCredentials);
    };

    if !verify_secret(&principal.password_hash, password) {
      return Err(Error::InvalidCredentials);
    }
    if principal.privilege_class() != self.class {
      return Err(Error::WrongPrivilegeClass);
    }
    if !principal.is_active {
      return Err(Error::Inactive);
    }
    Ok(principal)
  }
}

impl<S: PrincipalStore + SessionStore> Authenticator<S> {
  /// Authenticate and, on success, rotate the session and populate this
  /// authenticator's slot on the new handle.
  ///
  /// `previous` is the handle the client presented, if any. Its live slots
  /// move to the returned handle. A failed attempt leaves it untouched.
  pub async fn log_in(
    &self,
    sessions: &IdentitySession<S>,
    previous: Option<&SessionHandle>,
    email: &str,
    password: &str,
  ) -> Result<(SessionHandle, Principal)> {
    let principal = self.authenticate(email, password).await?;
    let session = sessions.rotate(previous).await?;
    sessions.set(self.slot(), &session, &principal).await?;
    tracing::info!(principal_id = %principal.principal_id, slot = ?self.slot(), "logged in");
    Ok((session, principal))
  }
}
