//! Stockwatch server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `STOCKWATCH_*` environment overrides, opens an in-process SQLite store,
//! optionally starts the scheduled refresh, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p stockwatch-server -- --hash-password
//! ```

mod schedule;
mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use stockwatch_api::AppState;
use stockwatch_core::{Dashboard, catalog::CatalogSeed, source::MockSource};
use stockwatch_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Stockwatch quick-commerce inventory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let seed = CatalogSeed::default();
  let source = Arc::new(MockSource::new(seed.clone()));
  let dashboard = Arc::new(
    Dashboard::new(Arc::new(store), server_cfg.thresholds())
      .with_seed(seed)
      .with_refresh_interval(server_cfg.refresh_interval()),
  );

  if server_cfg.seed_on_start {
    dashboard.seed().await.context("failed to seed catalog")?;
  }

  match server_cfg.refresh_interval() {
    Some(every) => {
      tracing::info!(every_secs = every.as_secs(), "scheduled refresh enabled");
      schedule::spawn_refresh_loop(dashboard.clone(), source.clone(), every);
    }
    None => tracing::info!("scheduled refresh disabled"),
  }

  let mut state = AppState::new(dashboard, source);
  match server_cfg.auth() {
    Some(auth) => state = state.with_auth(auth),
    None => tracing::warn!("no admin credentials configured; mutating endpoints are open"),
  }

  let app = stockwatch_api::api_router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
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
