//! Background expiry of stale tokens and lapsed session values.

use std::time::Duration;

use chrono::Utc;
use fund_core::{
  session::IdentitySession,
  store::{SessionStore, TokenRepository},
  token::TokenService,
};
use tokio::task::JoinHandle;

/// Run [`TokenService::sweep`] and [`IdentitySession::sweep`] now and then
/// every `period`.
///
/// A failed sweep is logged and retried on the next tick.
pub fn spawn<S>(
  tokens: TokenService<S>,
  sessions: IdentitySession<S>,
  period: Duration,
) -> JoinHandle<()>
where
  S: TokenRepository + SessionStore + 'static,
{
  let period = period.max(Duration::from_secs(1));
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      let now = Utc::now();
      if let Err(e) = tokens.sweep(now).await {
        tracing::warn!(error = %e, "token sweep failed");
      }
      if let Err(e) = sessions.sweep(now).await {
        tracing::warn!(error = %e, "session sweep failed");
      }
    }
  })
}
