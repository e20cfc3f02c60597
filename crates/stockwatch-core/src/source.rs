//! Observation sources: anything that can produce a batch of raw stock
//! readings on demand.
//!
//! The reconciler makes no assumption about how a batch is produced or how
//! long it takes. [`MockSource`] simulates a sweep over the seed catalog.

use std::{
  convert::Infallible,
  future::{Future, ready},
  sync::{Mutex, PoisonError},
};

use chrono::Utc;
use rand_core::{OsRng, RngCore};

use crate::{catalog::CatalogSeed, stock::RawObservation};

/// A producer of raw observation batches.
pub trait ObservationSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Produce one full sweep (or a subset) of store × product readings.
  fn produce(
    &self,
  ) -> impl Future<Output = Result<Vec<RawObservation>, Self::Error>> + Send + '_;
}

/// A fixed batch is a source that always reports the same readings.
impl ObservationSource for Vec<RawObservation> {
  type Error = Infallible;

  fn produce(
    &self,
  ) -> impl Future<Output = Result<Vec<RawObservation>, Self::Error>> + Send + '_ {
    ready(Ok(self.clone()))
  }
}

// ─── Mock ────────────────────────────────────────────────────────────────────

/// Price around which mock readings vary by ±10 %.
pub const MOCK_BASE_PRICE: f64 = 199.0;

/// Generates one reading per area × store template × product of a
/// [`CatalogSeed`], with a weighted stock distribution: 15 % empty shelves,
/// 15 % between 1 and 20 units, 70 % between 30 and 109 units.
pub struct MockSource<R = OsRng> {
  seed: CatalogSeed,
  rng:  Mutex<R>,
}

impl MockSource<OsRng> {
  pub fn new(seed: CatalogSeed) -> Self { Self::with_rng(seed, OsRng) }
}

impl<R: RngCore> MockSource<R> {
  pub fn with_rng(seed: CatalogSeed, rng: R) -> Self {
    Self { seed, rng: Mutex::new(rng) }
  }

  pub fn seed(&self) -> &CatalogSeed { &self.seed }

  fn sweep(&self) -> Vec<RawObservation> {
    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
    let observed_at = Utc::now();
    let mut batch = Vec::with_capacity(
      self.seed.areas.len() * self.seed.store_templates.len() * self.seed.products.len(),
    );

    for area in &self.seed.areas {
      for template in &self.seed.store_templates {
        let store_code = template.store_code(&area.pincode);
        for product in &self.seed.products {
          batch.push(RawObservation {
            pincode: area.pincode.clone(),
            store_code: store_code.clone(),
            sku: product.sku.clone(),
            stock_count: mock_stock_count(&mut *rng),
            price: mock_price(&mut *rng, MOCK_BASE_PRICE),
            observed_at,
          });
        }
      }
    }

    batch
  }
}

impl<R: RngCore + Send> ObservationSource for MockSource<R> {
  type Error = Infallible;

  fn produce(
    &self,
  ) -> impl Future<Output = Result<Vec<RawObservation>, Self::Error>> + Send + '_ {
    ready(Ok(self.sweep()))
  }
}

/// Uniform sample in `[0, 1)`.
fn unit(rng: &mut impl RngCore) -> f64 {
  f64::from(rng.next_u32()) / (f64::from(u32::MAX) + 1.0)
}

fn mock_stock_count(rng: &mut impl RngCore) -> u32 {
  let roll = unit(rng);
  if roll < 0.15 {
    0
  } else if roll < 0.30 {
    (unit(rng) * 20.0) as u32 + 1
  } else {
    (unit(rng) * 80.0) as u32 + 30
  }
}

fn mock_price(rng: &mut impl RngCore, base: f64) -> f64 {
  let variance = unit(rng) * 0.2 - 0.1;
  (base * (1.0 + variance) * 100.0).round() / 100.0
}
