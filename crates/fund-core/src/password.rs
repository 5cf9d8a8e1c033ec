//! Password hashing and verification using Argon2id.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A well-formed Argon2id hash with default parameters that no password
/// matches. Verified against when an account lookup fails, so an unknown
/// email costs the same work as a wrong password.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$ZnVuZC1kdW1teS1zYWx0IQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::InvalidInput(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string(),
  )
}

/// Check `password` against a stored PHC string.
///
/// A malformed stored hash verifies as `false`; it is logged, never surfaced.
pub fn verify_secret(password_hash: &str, password: &str) -> bool {
  let parsed = match PasswordHash::new(password_hash) {
    Ok(parsed) => parsed,
    Err(e) => {
      tracing::warn!("stored password hash is malformed: {e}");
      return false;
    }
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
