pub mod accounts;
pub mod moderation;
pub mod projects;
pub mod session;

use serde::Deserialize;

/// Body carrying only a password.
#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub password: String,
}

/// Body of the two login routes.
#[derive(Debug, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}
