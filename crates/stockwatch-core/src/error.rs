//! Error types for `stockwatch-core`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A reconciliation is already in flight; the caller may retry later.
  #[error("a reconciliation is already running")]
  Busy,

  #[error("area not found: {0}")]
  AreaNotFound(String),

  #[error("store not found: {0}")]
  StoreNotFound(String),

  /// The persistence layer failed. Any replacement in progress was rolled
  /// back.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] BoxError),

  /// The observation source failed to produce a batch.
  #[error("observation source failed: {0}")]
  Source(#[source] BoxError),
}

impl Error {
  /// Stable machine-readable category, surfaced alongside the message.
  pub fn category(&self) -> &'static str {
    match self {
      Self::Busy => "busy",
      Self::AreaNotFound(_) | Self::StoreNotFound(_) => "not_found",
      Self::StoreUnavailable(_) => "store_unavailable",
      Self::Source(_) => "source_unavailable",
    }
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(e))
  }

  pub(crate) fn source<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Source(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
