//! fund-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `FUND_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP. A background task sweeps expired tokens and lapsed
//! session values.
//!
//! # Maintenance modes
//!
//! ```text
//! fund-server --hash-password              # print an argon2 hash for a stdin password
//! fund-server --create-superuser <EMAIL>   # create an active admin account
//! fund-server --sweep-tokens [--all]       # delete expired (or all) tokens and exit
//! fund-server --sweep-sessions             # delete lapsed session values and exit
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use fund_core::{
  password::hash_password,
  principal::NewPrincipal,
  session::IdentitySession,
  store::PrincipalStore,
  token::TokenService,
};
use fund_store_sqlite::SqliteStore;
use fund_web::{AppState, ServerConfig, notify::LogNotifier};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Crowdfunding API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create an active superuser with this email (password read from stdin)
  /// and exit.
  #[arg(long, value_name = "EMAIL")]
  create_superuser: Option<String>,

  /// Delete expired activation and password-reset tokens and exit.
  #[arg(long)]
  sweep_tokens: bool,

  /// With `--sweep-tokens`, delete every token regardless of age.
  #[arg(long, requires = "sweep_tokens")]
  all: bool,

  /// Delete session values older than the configured TTL and exit.
  #[arg(long)]
  sweep_sessions: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FUND"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  if cli.sweep_tokens {
    let tokens = TokenService::new(store.clone());
    let deleted = if cli.all {
      tokens.purge_all().await?
    } else {
      tokens.sweep(Utc::now()).await?
    };
    println!("deleted {deleted} token(s)");
    return Ok(());
  }

  if cli.sweep_sessions {
    let sessions = IdentitySession::with_ttl(store.clone(), server_cfg.session_ttl());
    let deleted = sessions.sweep(Utc::now()).await?;
    println!("deleted {deleted} session value(s)");
    return Ok(());
  }

  if let Some(email) = cli.create_superuser {
    let password = read_password()?;
    let principal = store
      .create_principal(NewPrincipal::superuser(email, "", "", hash_password(&password)?))
      .await?
      .context("an account with this email already exists")?;
    println!("created superuser {}", principal.principal_id);
    return Ok(());
  }

  let tokens = TokenService::new(store.clone());
  let sessions = IdentitySession::with_ttl(store.clone(), server_cfg.session_ttl());
  fund_web::sweep::spawn(
    tokens,
    sessions,
    Duration::from_secs(server_cfg.sweep_interval_secs),
  );

  let notifier = Arc::new(LogNotifier::new(server_cfg.base_url.clone()));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = fund_web::router(AppState::new(store, server_cfg, notifier));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
