//! Single-use, time-limited tokens for account activation and password reset.
//!
//! A token identifier is a bearer capability sent in a URL, so it carries 128
//! bits of OS randomness and is never persisted in clear text: stores only see
//! its SHA-256 digest.
//!
//! Expiry is always re-checked inline on validation. [`TokenService::sweep`]
//! only reclaims space.

use std::{fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result, store::TokenRepository};

/// Number of random bytes in a token identifier.
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
  Activation,
  PasswordReset,
}

impl TokenKind {
  pub const ALL: [TokenKind; 2] = [TokenKind::Activation, TokenKind::PasswordReset];

  /// How long a token of this kind stays live after issue.
  pub fn ttl(self) -> Duration {
    match self {
      TokenKind::Activation => Duration::hours(24),
      TokenKind::PasswordReset => Duration::hours(1),
    }
  }
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// The secret identifier handed to the principal. Deliberately not `Debug`-
/// printable in full.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenId(String);

impl TokenId {
  /// Generate a fresh identifier from the OS RNG.
  pub fn generate() -> Self {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self(URL_SAFE_NO_PAD.encode(bytes))
  }

  /// Wrap an identifier presented by a client (e.g. from a URL path).
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The value under which the store indexes this token.
  pub fn digest(&self) -> TokenDigest {
    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    TokenDigest(hex::encode(hasher.finalize()))
  }
}

impl fmt::Debug for TokenId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("TokenId(..)")
  }
}

/// SHA-256 of a [`TokenId`], hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
  /// Rehydrate a digest read back from storage.
  pub fn from_hex(hex: impl Into<String>) -> Self { Self(hex.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Token values ────────────────────────────────────────────────────────────

/// A freshly issued token. The only place the clear identifier exists.
#[derive(Debug, Clone)]
pub struct Token {
  pub id:        TokenId,
  pub owner_id:  Uuid,
  pub kind:      TokenKind,
  pub issued_at: DateTime<Utc>,
}

impl Token {
  pub fn record(&self) -> TokenRecord {
    TokenRecord {
      digest:    self.id.digest(),
      owner_id:  self.owner_id,
      kind:      self.kind,
      issued_at: self.issued_at,
    }
  }
}

/// The persisted form of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
  pub digest:    TokenDigest,
  pub owner_id:  Uuid,
  pub kind:      TokenKind,
  pub issued_at: DateTime<Utc>,
}

impl TokenRecord {
  /// Expired iff strictly more than the TTL has elapsed since issue.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now - self.issued_at > self.kind.ttl()
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Issues, validates, and expires tokens over a [`TokenRepository`].
#[derive(Clone)]
pub struct TokenService<S> {
  store: Arc<S>,
}

impl<S: TokenRepository> TokenService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Issue a new token of `kind` for `owner_id`, invalidating any earlier one
  /// of the same kind.
  pub async fn issue(
    &self,
    kind: TokenKind,
    owner_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Token> {
    let token = Token {
      id: TokenId::generate(),
      owner_id,
      kind,
      issued_at: now,
    };
    self
      .store
      .replace_token(token.record())
      .await
      .map_err(Error::store)?;
    tracing::debug!(?kind, %owner_id, "issued token");
    Ok(token)
  }

  /// Validate a presented token and return its owner.
  ///
  /// Activation tokens are consumed by a successful validation. Password-reset
  /// tokens are not; call [`TokenService::consume`] once the new password has
  /// been stored. An expired token is deleted and reported as
  /// [`Error::Expired`].
  pub async fn validate(
    &self,
    kind: TokenKind,
    id: &TokenId,
    now: DateTime<Utc>,
  ) -> Result<Uuid> {
    let digest = id.digest();
    match kind {
      TokenKind::Activation => {
        let record = self
          .store
          .take_token(kind, digest)
          .await
          .map_err(Error::store)?
          .ok_or(Error::NotFound)?;
        if record.is_expired(now) {
          return Err(Error::Expired);
        }
        Ok(record.owner_id)
      }
      TokenKind::PasswordReset => {
        let record = self
          .store
          .find_token(kind, digest.clone())
          .await
          .map_err(Error::store)?
          .ok_or(Error::NotFound)?;
        if record.is_expired(now) {
          self
            .store
            .delete_token(kind, digest)
            .await
            .map_err(Error::store)?;
          return Err(Error::Expired);
        }
        Ok(record.owner_id)
      }
    }
  }

  /// Delete a token after the action it authorised has completed. Returns
  /// `false` if it was already gone.
  pub async fn consume(&self, kind: TokenKind, id: &TokenId) -> Result<bool> {
    self
      .store
      .delete_token(kind, id.digest())
      .await
      .map_err(Error::store)
  }

  /// Delete every token whose TTL has elapsed as of `now`.
  pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
    let mut deleted = 0;
    for kind in TokenKind::ALL {
      deleted += self
        .store
        .delete_expired(kind, now - kind.ttl())
        .await
        .map_err(Error::store)?;
    }
    if deleted > 0 {
      tracing::info!(deleted, "swept expired tokens");
    }
    Ok(deleted)
  }

  /// Delete every token of every kind owned by `owner_id`.
  pub async fn revoke_all(&self, owner_id: Uuid) -> Result<usize> {
    self
      .store
      .delete_tokens_for_owner(owner_id)
      .await
      .map_err(Error::store)
  }

  /// Delete every token, live or not.
  pub async fn purge_all(&self) -> Result<usize> {
    self.store.delete_all_tokens().await.map_err(Error::store)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::MemoryStore;

  fn service() -> (TokenService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (TokenService::new(store.clone()), store)
  }

  #[test]
  fn identifiers_carry_128_bits() {
    let id = TokenId::generate();
    let decoded = URL_SAFE_NO_PAD.decode(id.as_str()).unwrap();
    assert_eq!(decoded.len(), 16);
    assert_ne!(id, TokenId::generate());
  }

  #[test]
  fn debug_does_not_leak_identifier() {
    let id = TokenId::generate();
    assert!(!format!("{id:?}").contains(id.as_str()));
  }

  #[tokio::test]
  async fn reissue_leaves_one_live_token() {
    let (svc, store) = service();
    let owner = Uuid::new_v4();
    let now = Utc::now();

    let first = svc.issue(TokenKind::PasswordReset, owner, now).await.unwrap();
    let second = svc.issue(TokenKind::PasswordReset, owner, now).await.unwrap();

    assert_eq!(store.token_count(owner, TokenKind::PasswordReset), 1);
    assert!(matches!(
      svc.validate(TokenKind::PasswordReset, &first.id, now).await,
      Err(Error::NotFound)
    ));
    assert_eq!(
      svc.validate(TokenKind::PasswordReset, &second.id, now).await.unwrap(),
      owner
    );
  }

  #[tokio::test]
  async fn reissue_does_not_touch_other_kind() {
    let (svc, store) = service();
    let owner = Uuid::new_v4();
    let now = Utc::now();

    svc.issue(TokenKind::Activation, owner, now).await.unwrap();
    svc.issue(TokenKind::PasswordReset, owner, now).await.unwrap();

    assert_eq!(store.token_count(owner, TokenKind::Activation), 1);
    assert_eq!(store.token_count(owner, TokenKind::PasswordReset), 1);
  }

  #[tokio::test]
  async fn activation_validates_exactly_once() {
    let (svc, _) = service();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    let token = svc.issue(TokenKind::Activation, owner, now).await.unwrap();

    assert_eq!(
      svc.validate(TokenKind::Activation, &token.id, now).await.unwrap(),
      owner
    );
    assert!(matches!(
      svc.validate(TokenKind::Activation, &token.id, now).await,
      Err(Error::NotFound)
    ));
  }

  #[tokio::test]
  async fn reset_validates_until_consumed() {
    let (svc, _) = service();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    let token = svc.issue(TokenKind::PasswordReset, owner, now).await.unwrap();

    for _ in 0..3 {
      assert!(svc.validate(TokenKind::PasswordReset, &token.id, now).await.is_ok());
    }
    assert!(svc.consume(TokenKind::PasswordReset, &token.id).await.unwrap());
    assert!(matches!(
      svc.validate(TokenKind::PasswordReset, &token.id, now).await,
      Err(Error::NotFound)
    ));
    assert!(!svc.consume(TokenKind::PasswordReset, &token.id).await.unwrap());
  }

  #[tokio::test]
  async fn expiry_boundary_per_kind() {
    let eps = Duration::seconds(1);
    for kind in TokenKind::ALL {
      let (svc, _) = service();
      let owner = Uuid::new_v4();
      let t0 = Utc::now();

      let live = svc.issue(kind, owner, t0).await.unwrap();
      assert!(svc.validate(kind, &live.id, t0 + kind.ttl() - eps).await.is_ok());

      let stale = svc.issue(kind, owner, t0).await.unwrap();
      assert!(matches!(
        svc.validate(kind, &stale.id, t0 + kind.ttl() + eps).await,
        Err(Error::Expired)
      ));
      // The expired token was deleted on the failed check.
      assert!(matches!(
        svc.validate(kind, &stale.id, t0).await,
        Err(Error::NotFound)
      ));
    }
  }

  #[tokio::test]
  async fn token_is_valid_at_exactly_ttl() {
    let (svc, _) = service();
    let t0 = Utc::now();
    let token = svc.issue(TokenKind::PasswordReset, Uuid::new_v4(), t0).await.unwrap();
    assert!(
      svc
        .validate(TokenKind::PasswordReset, &token.id, t0 + TokenKind::PasswordReset.ttl())
        .await
        .is_ok()
    );
  }

  #[tokio::test]
  async fn sweep_removes_only_elapsed_tokens() {
    let (svc, _) = service();
    let t0 = Utc::now();
    let now = t0 + Duration::hours(2);

    // Reset tokens live for 1h, activation for 24h.
    svc.issue(TokenKind::PasswordReset, Uuid::new_v4(), t0).await.unwrap();
    svc.issue(TokenKind::Activation, Uuid::new_v4(), t0).await.unwrap();
    svc.issue(TokenKind::PasswordReset, Uuid::new_v4(), now).await.unwrap();

    assert_eq!(svc.sweep(now).await.unwrap(), 1);
    assert_eq!(svc.sweep(now).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn revoke_all_clears_every_kind_for_owner() {
    let (svc, store) = service();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let now = Utc::now();

    svc.issue(TokenKind::Activation, owner, now).await.unwrap();
    svc.issue(TokenKind::PasswordReset, owner, now).await.unwrap();
    svc.issue(TokenKind::Activation, other, now).await.unwrap();

    assert_eq!(svc.revoke_all(owner).await.unwrap(), 2);
    assert_eq!(store.token_count(other, TokenKind::Activation), 1);
  }
}
