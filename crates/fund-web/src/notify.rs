//! A [`Notifier`] that writes account links to the log.
//!
//! Stands in for mail delivery. The links contain live bearer tokens, so the
//! events are emitted at `info` under their own target and can be filtered.

use fund_core::{Result, notify::Notifier, principal::Principal, token::TokenId};

pub struct LogNotifier {
  base_url: String,
}

impl LogNotifier {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into().trim_end_matches('/').to_owned() }
  }

  fn link(&self, path: &str, token: &TokenId) -> String {
    format!("{}{path}/{}", self.base_url, token.as_str())
  }
}

impl Notifier for LogNotifier {
  fn send_activation_link(&self, principal: &Principal, token: &TokenId) -> Result<()> {
    tracing::info!(
      target: "fund_web::mail",
      to = %principal.email,
      link = %self.link("/accounts/activate", token),
      "activation link"
    );
    Ok(())
  }

  fn send_password_reset_link(&self, principal: &Principal, token: &TokenId) -> Result<()> {
    tracing::info!(
      target: "fund_web::mail",
      to = %principal.email,
      link = %self.link("/accounts/password-reset", token),
      "password reset link"
    );
    Ok(())
  }
}
