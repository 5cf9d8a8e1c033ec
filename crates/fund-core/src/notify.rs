//! Outbound notification seam.
//!
//! The core only produces tokens; delivering the links is someone else's job.

use crate::{Result, principal::Principal, token::TokenId};

pub trait Notifier: Send + Sync {
  fn send_activation_link(&self, principal: &Principal, token: &TokenId) -> Result<()>;

  fn send_password_reset_link(&self, principal: &Principal, token: &TokenId) -> Result<()>;
}
