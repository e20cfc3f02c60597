//! Stock observations and the derived stock facts that form the snapshot.
//!
//! A [`RawObservation`] is what a source reports; a [`StockFact`] is what the
//! reconciler derives and persists. The persisted set of facts is always the
//! result of exactly one ingestion batch: each batch replaces the previous one
//! wholesale and facts are never updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, Store};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Stock-health classification of a product in a store.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockStatus {
  Full,
  Low,
  OutOfStock,
}

/// Display band of a raw stock count. Purely presentational; never feeds
/// into [`StockStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountBand {
  Low,
  High,
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// One stock reading from an observation source. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
  pub pincode:     String,
  pub store_code:  String,
  pub sku:         String,
  pub stock_count: u32,
  pub price:       f64,
  #[serde(default = "Utc::now")]
  pub observed_at: DateTime<Utc>,
}

impl RawObservation {
  /// Convenience constructor stamping the observation with the current time.
  pub fn new(
    pincode: impl Into<String>,
    store_code: impl Into<String>,
    sku: impl Into<String>,
    stock_count: u32,
    price: f64,
  ) -> Self {
    Self {
      pincode: pincode.into(),
      store_code: store_code.into(),
      sku: sku.into(),
      stock_count,
      price,
      observed_at: Utc::now(),
    }
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::InventoryStore::replace_stock_facts`]; `id` is
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStockFact {
  pub product_id:  i64,
  pub store_id:    i64,
  pub area_id:     i64,
  pub status:      StockStatus,
  pub stock_count: u32,
  pub price:       f64,
  pub doi:         f64,
  pub observed_at: DateTime<Utc>,
}

/// A persisted, derived stock reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockFact {
  pub id:          i64,
  pub product_id:  i64,
  pub store_id:    i64,
  pub area_id:     i64,
  pub status:      StockStatus,
  pub stock_count: u32,
  pub price:       f64,
  /// Days of inventory, rounded to two decimal places.
  pub doi:         f64,
  pub observed_at: DateTime<Utc>,
}

/// A stock fact joined with the product and store it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
  pub fact:    StockFact,
  pub product: Product,
  pub store:   Store,
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Per-area status tally over the current snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaStatusCounts {
  pub area_id:      i64,
  pub total:        usize,
  pub out_of_stock: usize,
  pub low:          usize,
}

/// Row counts of every collection, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  pub areas:       usize,
  pub stores:      usize,
  pub products:    usize,
  pub stock_facts: usize,
}
