//! Runtime server configuration, deserialised from `config.toml` layered with
//! `STOCKWATCH_*` environment variables.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use stockwatch_api::AuthConfig;
use stockwatch_core::calc::Thresholds;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Seconds between scheduled refreshes; `0` disables the timer.
  #[serde(default = "default_refresh_interval_secs")]
  pub refresh_interval_secs: u64,
  #[serde(default = "default_low_doi_days")]
  pub low_doi_days:          f64,
  #[serde(default = "default_display_low_count")]
  pub display_low_count:     u32,
  #[serde(default)]
  pub seed_on_start:         bool,
  pub admin_username:        Option<String>,
  pub admin_password_hash:   Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("stockwatch.db") }

fn default_refresh_interval_secs() -> u64 { 300 }

fn default_low_doi_days() -> f64 { Thresholds::default().low_doi_days }

fn default_display_low_count() -> u32 { Thresholds::default().display_low_count }

impl ServerConfig {
  /// Load from the TOML file at `path` (optional) and the environment.
  pub fn load(path: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("STOCKWATCH").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn thresholds(&self) -> Thresholds {
    Thresholds {
      low_doi_days:      self.low_doi_days,
      display_low_count: self.display_low_count,
    }
  }

  pub fn refresh_interval(&self) -> Option<Duration> {
    (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
  }

  /// Admin credentials, only when both halves are configured.
  pub fn auth(&self) -> Option<AuthConfig> {
    match (&self.admin_username, &self.admin_password_hash) {
      (Some(username), Some(password_hash)) => Some(AuthConfig {
        username:      username.clone(),
        password_hash: password_hash.clone(),
      }),
      _ => None,
    }
  }
}
