//! SQLite backend for the Stockwatch inventory store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call is serialised on that
//! thread, and the snapshot swap runs inside one transaction, so readers see
//! either the previous or the new stock snapshot and never a mix.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
