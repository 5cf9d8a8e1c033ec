//! Dual-identity sessions.
//!
//! One browser session holds two independent identity slots. A staff member
//! can browse the site as themselves in the User slot and administer it in the
//! Admin slot at the same time. Each slot lives under its own key in the
//! [`SessionStore`]; no slot operation ever reads or writes the other's key.
//!
//! A slot value lapses [`DEFAULT_SESSION_TTL_SECS`] after it was last written
//! unless configured otherwise. Every successful login moves the session to a
//! fresh handle (see [`IdentitySession::rotate`]).

use std::{fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::{
  Error, Result,
  principal::{Principal, PrivilegeClass},
  store::SessionStore,
};

/// Opaque handle identifying one client session (carried in a cookie).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
  pub fn generate() -> Self {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    Self(URL_SAFE_NO_PAD.encode(bytes))
  }

  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for SessionHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SessionHandle(..)")
  }
}

/// One of the two identity holders within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
  User,
  Admin,
}

impl Slot {
  /// The storage key owned by this slot.
  pub fn key(self) -> &'static str {
    match self {
      Slot::User => "user_principal_id",
      Slot::Admin => "admin_principal_id",
    }
  }

  /// The only privilege class this slot may hold.
  pub fn privilege_class(self) -> PrivilegeClass {
    match self {
      Slot::User => PrivilegeClass::Ordinary,
      Slot::Admin => PrivilegeClass::Elevated,
    }
  }

  pub fn for_class(class: PrivilegeClass) -> Self {
    match class {
      PrivilegeClass::Ordinary => Slot::User,
      PrivilegeClass::Elevated => Slot::Admin,
    }
  }

  fn name(self) -> &'static str {
    match self {
      Slot::User => "user",
      Slot::Admin => "admin",
    }
  }
}

/// Two weeks.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Reads and writes the two identity slots of a session.
#[derive(Clone)]
pub struct IdentitySession<S> {
  store: Arc<S>,
  ttl:   Duration,
}

impl<S: SessionStore> IdentitySession<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_ttl(store, Duration::seconds(DEFAULT_SESSION_TTL_SECS))
  }

  pub fn with_ttl(store: Arc<S>, ttl: Duration) -> Self { Self { store, ttl } }

  pub fn ttl(&self) -> Duration { self.ttl }

  fn cutoff(&self) -> DateTime<Utc> { Utc::now() - self.ttl }

  /// Store `principal` in `slot`.
  ///
  /// A principal of the wrong privilege class is refused with
  /// [`Error::ContractViolation`] and nothing is written.
  pub async fn set(
    &self,
    slot: Slot,
    session: &SessionHandle,
    principal: &Principal,
  ) -> Result<()> {
    let class = principal.privilege_class();
    if class != slot.privilege_class() {
      let err = Error::ContractViolation {
        principal_id: principal.principal_id,
        class,
        slot: slot.name(),
      };
      tracing::error!("{err}");
      return Err(err);
    }
    self
      .store
      .put_value(session.clone(), slot.key(), principal.principal_id.to_string())
      .await
      .map_err(Error::store)
  }

  /// The principal held by `slot`, if any.
  pub async fn get(&self, slot: Slot, session: &SessionHandle) -> Result<Option<Uuid>> {
    let raw = self
      .store
      .get_value(session.clone(), slot.key(), self.cutoff())
      .await
      .map_err(Error::store)?;
    Ok(raw.and_then(|s| match Uuid::parse_str(&s) {
      Ok(id) => Some(id),
      Err(e) => {
        tracing::warn!(slot = slot.name(), "ignoring unparseable slot value: {e}");
        None
      }
    }))
  }

  pub async fn clear(&self, slot: Slot, session: &SessionHandle) -> Result<()> {
    self
      .store
      .remove_value(session.clone(), slot.key())
      .await
      .map_err(Error::store)
  }

  pub async fn set_user(&self, session: &SessionHandle, principal: &Principal) -> Result<()> {
    self.set(Slot::User, session, principal).await
  }

  pub async fn set_admin(&self, session: &SessionHandle, principal: &Principal) -> Result<()> {
    self.set(Slot::Admin, session, principal).await
  }

  pub async fn get_user(&self, session: &SessionHandle) -> Result<Option<Uuid>> {
    self.get(Slot::User, session).await
  }

  pub async fn get_admin(&self, session: &SessionHandle) -> Result<Option<Uuid>> {
    self.get(Slot::Admin, session).await
  }

  pub async fn clear_user(&self, session: &SessionHandle) -> Result<()> {
    self.clear(Slot::User, session).await
  }

  pub async fn clear_admin(&self, session: &SessionHandle) -> Result<()> {
    self.clear(Slot::Admin, session).await
  }

  /// Clear both slots.
  pub async fn clear_all(&self, session: &SessionHandle) -> Result<()> {
    self.clear_user(session).await?;
    self.clear_admin(session).await
  }

  /// Issue a fresh handle carrying the live slots of `previous`, and empty
  /// `previous`.
  ///
  /// Run on every login, so a handle the client held (or was handed) before
  /// authenticating never carries the new identity.
  pub async fn rotate(&self, previous: Option<&SessionHandle>) -> Result<SessionHandle> {
    let fresh = SessionHandle::generate();
    let Some(previous) = previous else {
      return Ok(fresh);
    };
    for slot in [Slot::User, Slot::Admin] {
      let value = self
        .store
        .get_value(previous.clone(), slot.key(), self.cutoff())
        .await
        .map_err(Error::store)?;
      if let Some(value) = value {
        self
          .store
          .put_value(fresh.clone(), slot.key(), value)
          .await
          .map_err(Error::store)?;
      }
      self.clear(slot, previous).await?;
    }
    Ok(fresh)
  }

  /// Delete every slot value that has lapsed as of `now`.
  pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
    let purged = self
      .store
      .purge_values(now - self.ttl)
      .await
      .map_err(Error::store)?;
    if purged > 0 {
      tracing::info!(purged, "swept expired session values");
    }
    Ok(purged)
  }
}
