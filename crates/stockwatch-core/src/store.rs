//! The `InventoryStore` trait.
//!
//! Implemented by storage backends (e.g. `stockwatch-store-sqlite`). The
//! reconciler, the aggregation reader and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  catalog::{Area, CatalogSeed, Product, SeedReport, Store},
  stock::{AreaStatusCounts, NewStockFact, StockRecord, TableCounts},
};

/// Abstraction over a transactional inventory store.
///
/// Catalog collections are read-mostly and only written through
/// [`seed_catalog`](Self::seed_catalog). Stock facts are only written through
/// [`replace_stock_facts`](Self::replace_stock_facts), which swaps the whole
/// snapshot in one unit of work.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InventoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Insert every area, product and store of `seed` that is not already
  /// present (by pincode, SKU and store code respectively). Existing rows are
  /// never modified. Runs as a single transaction.
  fn seed_catalog<'a>(
    &'a self,
    seed: &'a CatalogSeed,
  ) -> impl Future<Output = Result<SeedReport, Self::Error>> + Send + 'a;

  fn find_area<'a>(
    &'a self,
    pincode: &'a str,
  ) -> impl Future<Output = Result<Option<Area>, Self::Error>> + Send + 'a;

  fn find_store<'a>(
    &'a self,
    store_code: &'a str,
  ) -> impl Future<Output = Result<Option<Store>, Self::Error>> + Send + 'a;

  fn find_product<'a>(
    &'a self,
    sku: &'a str,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + 'a;

  fn list_areas(
    &self,
  ) -> impl Future<Output = Result<Vec<Area>, Self::Error>> + Send + '_;

  fn list_stores(
    &self,
  ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send + '_;

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  // ── Snapshot ──────────────────────────────────────────────────────────

  /// Delete every stock fact and insert `facts` in their place, atomically.
  ///
  /// On error nothing changes: readers keep seeing the previous snapshot.
  /// Returns the number of facts inserted.
  fn replace_stock_facts(
    &self,
    facts: Vec<NewStockFact>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All current facts for an area joined with their product and store,
  /// newest observation first.
  fn stock_for_area(
    &self,
    area_id: i64,
  ) -> impl Future<Output = Result<Vec<StockRecord>, Self::Error>> + Send + '_;

  /// Status tallies for every area that has at least one current fact.
  fn status_counts_by_area(
    &self,
  ) -> impl Future<Output = Result<Vec<AreaStatusCounts>, Self::Error>> + Send + '_;

  fn table_counts(
    &self,
  ) -> impl Future<Output = Result<TableCounts, Self::Error>> + Send + '_;
}
