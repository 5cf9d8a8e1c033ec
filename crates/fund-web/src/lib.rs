//! JSON HTTP layer for the crowdfunding platform.
//!
//! Exposes an axum [`Router`] backed by any [`Backend`]. Identity lives in two
//! session slots (user and admin) keyed by the `fund_session` cookie.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Register; sends an activation link |
//! | `POST` | `/accounts/activate` | Resend the activation link; always 202 |
//! | `POST` | `/accounts/activate/{token}` | |
//! | `POST` | `/accounts/password-reset` | Always 202 |
//! | `GET`/`POST` | `/accounts/password-reset/{token}` | Check link / set password |
//! | `DELETE` | `/accounts/me` | User slot; body carries the password |
//! | `POST` | `/accounts/me/password` | User slot; old and new password |
//! | `GET`/`DELETE` | `/session` | Both slots |
//! | `POST`/`DELETE` | `/session/user`, `/session/admin` | Log in / out of one slot |
//! | `POST` | `/projects` | User slot |
//! | `GET` | `/projects/{id}` | Computed status, funding, and rating |
//! | `PUT` | `/projects/{id}/rating` | User slot; 1 to 5, replaces the caller's rating |
//! | `POST` | `/projects/{id}/cancel`, `/donations`, `/comments`, `/reports` | User slot |
//! | `POST` | `/comments/{id}/reports` | User slot |

pub mod error;
pub mod handlers;
pub mod notify;
pub mod session;
pub mod sweep;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use fund_core::{
  auth::Authenticator,
  lifecycle::ProjectLifecycle,
  moderation::ModerationGate,
  notify::Notifier,
  session::{DEFAULT_SESSION_TTL_SECS, IdentitySession},
  store::Backend,
  token::TokenService,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{accounts, moderation, projects, session as login};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `FUND_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// Public origin used to build links in outgoing notifications.
  pub base_url:            String,
  pub store_path:          PathBuf,
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
  /// Mark the session cookie `Secure`; enable behind TLS.
  #[serde(default)]
  pub secure_cookies:      bool,
  /// Session values older than this are ignored and later swept.
  #[serde(default = "default_session_ttl")]
  pub session_ttl_secs:    u64,
}

fn default_sweep_interval() -> u64 { 300 }

fn default_session_ttl() -> u64 { DEFAULT_SESSION_TTL_SECS.unsigned_abs() }

impl ServerConfig {
  /// `session_ttl_secs` as a duration, falling back to the default when it
  /// does not fit.
  pub fn session_ttl(&self) -> chrono::Duration {
    i64::try_from(self.session_ttl_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_SESSION_TTL_SECS))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:      Arc<S>,
  pub config:     Arc<ServerConfig>,
  pub notifier:   Arc<dyn Notifier>,
  pub tokens:     TokenService<S>,
  pub sessions:   IdentitySession<S>,
  pub users:      Authenticator<S>,
  pub admins:     Authenticator<S>,
  pub projects:   ProjectLifecycle<S>,
  pub moderation: ModerationGate<S>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig, notifier: Arc<dyn Notifier>) -> Self {
    Self {
      tokens: TokenService::new(store.clone()),
      sessions: IdentitySession::with_ttl(store.clone(), config.session_ttl()),
      users: Authenticator::ordinary(store.clone()),
      admins: Authenticator::elevated(store.clone()),
      projects: ProjectLifecycle::new(store.clone()),
      moderation: ModerationGate::new(store.clone()),
      config: Arc::new(config),
      notifier,
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    // Accounts
    .route("/accounts", post(accounts::register::<S>))
    .route("/accounts/activate", post(accounts::resend_activation::<S>))
    .route("/accounts/activate/{token}", post(accounts::activate::<S>))
    .route("/accounts/password-reset", post(accounts::request_reset::<S>))
    .route(
      "/accounts/password-reset/{token}",
      get(accounts::check_reset::<S>).post(accounts::complete_reset::<S>),
    )
    .route("/accounts/me", axum::routing::delete(accounts::delete_me::<S>))
    .route("/accounts/me/password", post(accounts::change_password::<S>))
    // Session slots
    .route("/session", get(login::show::<S>).delete(login::log_out_all::<S>))
    .route("/session/user", post(login::user_log_in::<S>).delete(login::user_log_out::<S>))
    .route("/session/admin", post(login::admin_log_in::<S>).delete(login::admin_log_out::<S>))
    // Projects
    .route("/projects", post(projects::create::<S>))
    .route("/projects/{id}", get(projects::show::<S>))
    .route("/projects/{id}/rating", put(projects::rate::<S>))
    .route("/projects/{id}/cancel", post(projects::cancel::<S>))
    .route("/projects/{id}/donations", post(projects::donate::<S>))
    .route("/projects/{id}/comments", post(projects::comment::<S>))
    // Moderation
    .route("/projects/{id}/reports", post(moderation::report_project::<S>))
    .route("/comments/{id}/reports", post(moderation::report_comment::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
