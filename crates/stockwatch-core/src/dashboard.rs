//! [`Dashboard`] — the caller-facing operations of the core, bundled over one
//! store.
//!
//! Transports (HTTP handlers, timers, CLIs) hold an `Arc<Dashboard<S>>` and
//! call these methods; none of them carry presentation concerns.

use std::{
  sync::{Arc, Mutex, PoisonError},
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  alert::WhatsAppAlert,
  calc::Thresholds,
  catalog::{CatalogSeed, SeedReport},
  ingest::{IngestReport, Reconciler},
  report::{AreaStockReport, AreaSummary, summarize_areas},
  source::ObservationSource,
  stock::{RawObservation, TableCounts},
  store::InventoryStore,
};

/// Outcome of [`Dashboard::refresh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
  /// Set when the catalog was empty and had to be seeded first.
  pub seeded:       Option<SeedReport>,
  pub received:     usize,
  pub saved:        usize,
  pub skipped:      usize,
  pub elapsed_ms:   u64,
  pub completed_at: DateTime<Utc>,
}

/// Whether a reconciliation is running and when the last one committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshStatus {
  pub running:  bool,
  pub last_run: Option<DateTime<Utc>>,
  /// `last_run` plus the scheduled interval, when one is configured.
  pub next_run: Option<DateTime<Utc>>,
}

pub struct Dashboard<S> {
  store:            Arc<S>,
  reconciler:       Reconciler,
  seed:             CatalogSeed,
  refresh_interval: Option<Duration>,
  last_run:         Mutex<Option<DateTime<Utc>>>,
}

impl<S: InventoryStore> Dashboard<S> {
  pub fn new(store: Arc<S>, thresholds: Thresholds) -> Self {
    Self {
      store,
      reconciler: Reconciler::new(thresholds),
      seed: CatalogSeed::default(),
      refresh_interval: None,
      last_run: Mutex::new(None),
    }
  }

  /// Replace the catalog ensured by [`seed`](Self::seed).
  pub fn with_seed(mut self, seed: CatalogSeed) -> Self {
    self.seed = seed;
    self
  }

  /// Record the cadence of scheduled refreshes, used to report `next_run`.
  pub fn with_refresh_interval(mut self, interval: Option<Duration>) -> Self {
    self.refresh_interval = interval;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn reconciler(&self) -> &Reconciler { &self.reconciler }

  pub fn thresholds(&self) -> &Thresholds { self.reconciler.thresholds() }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Ensure the reference catalog exists. Idempotent.
  pub async fn seed(&self) -> Result<SeedReport> {
    let report = self
      .store
      .seed_catalog(&self.seed)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      areas = report.areas_inserted,
      products = report.products_inserted,
      stores = report.stores_inserted,
      "catalog seeded",
    );
    Ok(report)
  }

  /// Reconcile `batch` into the snapshot; [`Error::Busy`] if a run is already
  /// in flight.
  pub async fn ingest(&self, batch: Vec<RawObservation>) -> Result<IngestReport> {
    let report = self.reconciler.ingest(&*self.store, batch).await?;
    self.mark_run(Utc::now());
    Ok(report)
  }

  /// Pull a batch from `source` and reconcile it, seeding an empty catalog
  /// first. The single-flight guard is held for the whole run.
  pub async fn refresh<R: ObservationSource>(&self, source: &R) -> Result<RefreshReport> {
    let Some(flight) = self.reconciler.flight().try_acquire() else {
      tracing::warn!("rejecting refresh: a reconciliation is already running");
      return Err(Error::Busy);
    };
    let started = Instant::now();

    let areas = self.store.list_areas().await.map_err(Error::store)?;
    let seeded = if areas.is_empty() {
      tracing::info!("catalog is empty, seeding before first refresh");
      Some(self.seed().await?)
    } else {
      None
    };

    let batch = source.produce().await.map_err(Error::source)?;
    let received = batch.len();
    let IngestReport { saved, skipped } =
      self.reconciler.reconcile(&flight, &*self.store, batch).await?;

    let completed_at = Utc::now();
    self.mark_run(completed_at);

    Ok(RefreshReport {
      seeded,
      received,
      saved,
      skipped,
      elapsed_ms: started.elapsed().as_millis() as u64,
      completed_at,
    })
  }

  fn mark_run(&self, at: DateTime<Utc>) {
    *self.last_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The grouped stock report for an area, or `None` if no area has this
  /// pincode.
  pub async fn query_area(&self, pincode: &str) -> Result<Option<AreaStockReport>> {
    let Some(area) = self.store.find_area(pincode).await.map_err(Error::store)? else {
      return Ok(None);
    };
    let records = self
      .store
      .stock_for_area(area.id)
      .await
      .map_err(Error::store)?;
    Ok(Some(AreaStockReport::build(&area, records, self.thresholds())))
  }

  /// Every area with status tallies over the current snapshot.
  pub async fn list_areas_summary(&self) -> Result<Vec<AreaSummary>> {
    let areas = self.store.list_areas().await.map_err(Error::store)?;
    let counts = self
      .store
      .status_counts_by_area()
      .await
      .map_err(Error::store)?;
    Ok(summarize_areas(areas, &counts))
  }

  /// Compose the WhatsApp alert for one store of an area.
  pub async fn store_alert(&self, pincode: &str, store_code: &str) -> Result<WhatsAppAlert> {
    let report = self
      .query_area(pincode)
      .await?
      .ok_or_else(|| Error::AreaNotFound(pincode.to_owned()))?;
    let store = report
      .store(store_code)
      .ok_or_else(|| Error::StoreNotFound(store_code.to_owned()))?;
    Ok(WhatsAppAlert::compose(&report, store))
  }

  pub fn status(&self) -> RefreshStatus {
    let last_run = *self.last_run.lock().unwrap_or_else(PoisonError::into_inner);
    let next_run = last_run
      .zip(self.refresh_interval)
      .and_then(|(at, every)| chrono::Duration::from_std(every).ok().map(|d| at + d));
    RefreshStatus {
      running: self.reconciler.flight().is_running(),
      last_run,
      next_run,
    }
  }

  pub async fn table_counts(&self) -> Result<TableCounts> {
    self.store.table_counts().await.map_err(Error::store)
  }
}
