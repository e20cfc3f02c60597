//! Core types and trait definitions for Stockwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the DOI/status calculator, the ingestion reconciler and the aggregation
//! reader; storage backends and observation sources plug in through the
//! [`store::InventoryStore`] and [`source::ObservationSource`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod calc;
pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod report;
pub mod source;
pub mod stock;
pub mod store;

pub use dashboard::Dashboard;
pub use error::{Error, Result};
