//! Ingestion reconciler — turns a raw observation batch into the current
//! stock snapshot.
//!
//! A run loads the whole catalog once, resolves every observation against an
//! in-memory [`CatalogIndex`], derives DOI and status, and hands the complete
//! candidate batch to [`InventoryStore::replace_stock_facts`], which swaps the
//! snapshot in a single transaction. Unresolvable observations are dropped
//! and counted; they never fail the batch.
//!
//! At most one run is in flight at a time. A second caller is rejected with
//! [`Error::Busy`] instead of being queued or interleaved.

use std::{
  sync::atomic::{AtomicBool, Ordering},
  time::Instant,
};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  calc::{Thresholds, calculate_doi, determine_stock_status},
  catalog::CatalogIndex,
  stock::{NewStockFact, RawObservation},
  store::InventoryStore,
};

// ─── Single-flight guard ─────────────────────────────────────────────────────

/// A non-blocking mutual-exclusion flag.
#[derive(Debug, Default)]
pub struct SingleFlight {
  running: AtomicBool,
}

/// Proof that the holder owns the flight. Releases it on drop.
#[derive(Debug)]
pub struct FlightGuard<'a> {
  running: &'a AtomicBool,
}

impl SingleFlight {
  pub const fn new() -> Self { Self { running: AtomicBool::new(false) } }

  /// Take the flight if nobody holds it.
  pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
    self
      .running
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .ok()
      .map(|_| FlightGuard { running: &self.running })
  }

  pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

  /// Whether `guard` was taken from this flight.
  pub fn owns(&self, guard: &FlightGuard<'_>) -> bool {
    std::ptr::eq(guard.running, &self.running)
  }
}

impl Drop for FlightGuard<'_> {
  fn drop(&mut self) { self.running.store(false, Ordering::Release); }
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Outcome of a committed reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
  pub saved:   usize,
  pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct Reconciler {
  flight:     SingleFlight,
  thresholds: Thresholds,
}

impl Reconciler {
  pub fn new(thresholds: Thresholds) -> Self {
    Self { flight: SingleFlight::new(), thresholds }
  }

  pub fn thresholds(&self) -> &Thresholds { &self.thresholds }

  pub fn flight(&self) -> &SingleFlight { &self.flight }

  /// Take the flight and reconcile `batch`, or fail with [`Error::Busy`].
  pub async fn ingest<S: InventoryStore>(
    &self,
    store: &S,
    batch: Vec<RawObservation>,
  ) -> Result<IngestReport> {
    let Some(flight) = self.flight.try_acquire() else {
      tracing::warn!("rejecting ingest: a reconciliation is already running");
      return Err(Error::Busy);
    };
    self.reconcile(&flight, store, batch).await
  }

  /// Reconcile `batch` while holding `flight`, which must come from this
  /// reconciler's own [`SingleFlight`].
  pub(crate) async fn reconcile<S: InventoryStore>(
    &self,
    flight: &FlightGuard<'_>,
    store: &S,
    batch: Vec<RawObservation>,
  ) -> Result<IngestReport> {
    if !self.flight.owns(flight) {
      tracing::warn!("rejecting reconcile: guard belongs to another flight");
      return Err(Error::Busy);
    }
    let started = Instant::now();
    let received = batch.len();

    let areas = store.list_areas().await.map_err(Error::store)?;
    let stores = store.list_stores().await.map_err(Error::store)?;
    let products = store.list_products().await.map_err(Error::store)?;
    tracing::debug!(
      areas = areas.len(),
      stores = stores.len(),
      products = products.len(),
      "catalog loaded",
    );
    let index = CatalogIndex::build(areas, stores, products);

    let mut candidates = Vec::with_capacity(received);
    let mut skipped = 0;

    for obs in batch {
      let resolved = match index.resolve(&obs) {
        Ok(r) => r,
        Err(reason) => {
          tracing::debug!(
            pincode = %obs.pincode,
            store_code = %obs.store_code,
            sku = %obs.sku,
            %reason,
            "dropping unreconcilable observation",
          );
          skipped += 1;
          continue;
        }
      };

      let doi = calculate_doi(obs.stock_count, resolved.product.avg_daily_sales);
      let status = determine_stock_status(obs.stock_count, doi, &self.thresholds);

      candidates.push(NewStockFact {
        product_id: resolved.product.id,
        store_id: resolved.store.id,
        area_id: resolved.area.id,
        status,
        stock_count: obs.stock_count,
        price: obs.price,
        doi,
        observed_at: obs.observed_at,
      });
    }

    let saved = store
      .replace_stock_facts(candidates)
      .await
      .map_err(Error::store)?;

    tracing::info!(
      received,
      saved,
      skipped,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "stock snapshot replaced",
    );

    Ok(IngestReport { saved, skipped })
  }
}
