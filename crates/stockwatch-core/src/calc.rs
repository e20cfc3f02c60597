//! Days-of-inventory and stock-status calculation.
//!
//! Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};

use crate::stock::{CountBand, StockStatus};

/// Tunable classification boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
  /// A product with fewer days of inventory than this is [`StockStatus::Low`].
  pub low_doi_days:      f64,
  /// Stock counts below this are shown in the low display band.
  pub display_low_count: u32,
}

impl Default for Thresholds {
  fn default() -> Self {
    Self {
      low_doi_days:      3.0,
      display_low_count: 20,
    }
  }
}

impl Thresholds {
  pub fn count_band(&self, stock_count: u32) -> CountBand {
    if stock_count < self.display_low_count {
      CountBand::Low
    } else {
      CountBand::High
    }
  }
}

/// Round to two decimal places, half away from zero.
fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

/// Days of inventory: `stock_count / avg_daily_sales`, rounded to two
/// decimals.
///
/// A zero sales rate yields `0` rather than an error. Negative or non-finite
/// rates are treated the same way.
pub fn calculate_doi(stock_count: u32, avg_daily_sales: f64) -> f64 {
  if !(avg_daily_sales.is_finite() && avg_daily_sales > 0.0) {
    return 0.0;
  }
  round2(f64::from(stock_count) / avg_daily_sales)
}

/// Classify a product's stock. An empty shelf or zero DOI is out of stock;
/// otherwise DOI below the threshold is low.
pub fn determine_stock_status(
  stock_count: u32,
  doi: f64,
  thresholds: &Thresholds,
) -> StockStatus {
  if stock_count == 0 || doi == 0.0 {
    StockStatus::OutOfStock
  } else if doi < thresholds.low_doi_days {
    StockStatus::Low
  } else {
    StockStatus::Full
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn doi_divides_and_rounds() {
    assert_eq!(calculate_doi(15, 10.0), 1.5);
    assert_eq!(calculate_doi(50, 10.0), 5.0);
    assert_eq!(calculate_doi(10, 3.0), 3.33);
    assert_eq!(calculate_doi(20, 3.0), 6.67);
    assert_eq!(calculate_doi(0, 7.0), 0.0);
  }

  #[test]
  fn doi_matches_rounded_quotient() {
    for s in [0u32, 1, 7, 19, 20, 99, 1234] {
      for d in [0.5, 1.0, 3.0, 7.0, 12.5, 25.0] {
        let expected = (f64::from(s) / d * 100.0).round() / 100.0;
        assert_eq!(calculate_doi(s, d), expected, "s={s} d={d}");
      }
    }
  }

  #[test]
  fn zero_sales_rate_yields_zero_doi() {
    assert_eq!(calculate_doi(0, 0.0), 0.0);
    assert_eq!(calculate_doi(42, 0.0), 0.0);
    assert_eq!(calculate_doi(42, -1.0), 0.0);
    assert_eq!(calculate_doi(42, f64::NAN), 0.0);
  }

  #[test]
  fn status_policy() {
    let t = Thresholds::default();
    assert_eq!(determine_stock_status(0, 12.0, &t), StockStatus::OutOfStock);
    assert_eq!(determine_stock_status(5, 0.0, &t), StockStatus::OutOfStock);
    assert_eq!(determine_stock_status(5, 2.99, &t), StockStatus::Low);
    assert_eq!(determine_stock_status(5, 3.0, &t), StockStatus::Full);
  }

  #[test]
  fn status_honours_custom_threshold() {
    let t = Thresholds { low_doi_days: 7.0, ..Thresholds::default() };
    assert_eq!(determine_stock_status(50, 5.0, &t), StockStatus::Low);
    assert_eq!(determine_stock_status(70, 7.0, &t), StockStatus::Full);
  }

  #[test]
  fn count_band_is_independent_of_status() {
    let t = Thresholds::default();
    assert_eq!(t.count_band(19), CountBand::Low);
    assert_eq!(t.count_band(20), CountBand::High);
    // 25 units at 10/day is low stock but still in the high display band.
    assert_eq!(determine_stock_status(25, calculate_doi(25, 10.0), &t), StockStatus::Low);
  }
}
