//! Error type for `stockwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value outside its enumeration.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },

  /// An integer column held a value that does not fit its domain type.
  #[error("{column} out of range: {value}")]
  OutOfRange { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
