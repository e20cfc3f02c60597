//! Aggregation reader: per-area and per-store rollups of the current
//! snapshot.

use serde::{Deserialize, Serialize};

use crate::{
  alert::doi_alert,
  calc::Thresholds,
  catalog::{Area, Platform},
  stock::{AreaStatusCounts, CountBand, StockRecord, StockStatus},
};

// ─── Area detail ─────────────────────────────────────────────────────────────

/// One product line within a store summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStockDetail {
  pub name:        String,
  pub sku:         String,
  pub status:      StockStatus,
  pub stock_count: u32,
  pub count_band:  CountBand,
  pub price:       f64,
  pub doi:         f64,
  pub doi_alert:   String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStockSummary {
  pub store_code:      String,
  pub store_name:      String,
  pub platform:        Platform,
  pub products:        Vec<ProductStockDetail>,
  pub oos_count:       usize,
  pub low_stock_count: usize,
}

/// Everything the dashboard shows for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStockReport {
  pub area:               String,
  pub pincode:            String,
  pub city:               String,
  pub stores:             Vec<StoreStockSummary>,
  pub oos_products:       usize,
  pub low_stock_products: usize,
  pub total_products:     usize,
}

impl AreaStockReport {
  /// Group `records` by store, keeping the order in which each store first
  /// appears and the record order within each store.
  pub fn build(area: &Area, records: Vec<StockRecord>, thresholds: &Thresholds) -> Self {
    let total_products = records.len();
    let mut stores: Vec<StoreStockSummary> = Vec::new();

    for StockRecord { fact, product, store } in records {
      let idx = match stores.iter().position(|s| s.store_code == store.store_code) {
        Some(i) => i,
        None => {
          stores.push(StoreStockSummary {
            store_code:      store.store_code,
            store_name:      store.name,
            platform:        store.platform,
            products:        Vec::new(),
            oos_count:       0,
            low_stock_count: 0,
          });
          stores.len() - 1
        }
      };
      let summary = &mut stores[idx];

      match fact.status {
        StockStatus::OutOfStock => summary.oos_count += 1,
        StockStatus::Low => summary.low_stock_count += 1,
        StockStatus::Full => {}
      }

      summary.products.push(ProductStockDetail {
        name:        product.name,
        sku:         product.sku,
        status:      fact.status,
        stock_count: fact.stock_count,
        count_band:  thresholds.count_band(fact.stock_count),
        price:       fact.price,
        doi:         fact.doi,
        doi_alert:   doi_alert(fact.doi, fact.status),
      });
    }

    Self {
      area: area.name.clone(),
      pincode: area.pincode.clone(),
      city: area.city.clone(),
      oos_products: stores.iter().map(|s| s.oos_count).sum(),
      low_stock_products: stores.iter().map(|s| s.low_stock_count).sum(),
      total_products,
      stores,
    }
  }

  pub fn store(&self, store_code: &str) -> Option<&StoreStockSummary> {
    self.stores.iter().find(|s| s.store_code == store_code)
  }
}

// ─── Area list ───────────────────────────────────────────────────────────────

/// An area with status tallies over its current facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
  #[serde(flatten)]
  pub area:           Area,
  pub total_products: usize,
  pub oos_count:      usize,
  pub low_count:      usize,
}

/// Attach tallies to every area; areas without facts report zeros.
pub fn summarize_areas(areas: Vec<Area>, counts: &[AreaStatusCounts]) -> Vec<AreaSummary> {
  areas
    .into_iter()
    .map(|area| {
      let c = counts
        .iter()
        .find(|c| c.area_id == area.id)
        .copied()
        .unwrap_or_default();
      AreaSummary {
        area,
        total_products: c.total,
        oos_count: c.out_of_stock,
        low_count: c.low,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    catalog::{Product, Store},
    stock::StockFact,
  };

  fn area() -> Area {
    Area {
      id:         1,
      pincode:    "400001".into(),
      city:       "Mumbai".into(),
      name:       "South Mumbai".into(),
      created_at: Utc::now(),
    }
  }

  fn record(store_code: &str, sku: &str, status: StockStatus, count: u32, doi: f64) -> StockRecord {
    let now = Utc::now();
    StockRecord {
      fact:    StockFact {
        id: 0,
        product_id: 0,
        store_id: 0,
        area_id: 1,
        status,
        stock_count: count,
        price: 199.0,
        doi,
        observed_at: now - Duration::seconds(1),
      },
      product: Product {
        id:              0,
        sku:             sku.into(),
        name:            format!("Product {sku}"),
        category:        "Test".into(),
        brand:           "Test".into(),
        avg_daily_sales: 10.0,
        created_at:      now,
      },
      store:   Store {
        id:         0,
        store_code: store_code.into(),
        area_id:    1,
        platform:   Platform::Blinkit,
        name:       format!("Store {store_code}"),
        created_at: now,
      },
    }
  }

  #[test]
  fn groups_by_store_and_totals() {
    let records = vec![
      record("BLK_400001", "SKU001", StockStatus::OutOfStock, 0, 0.0),
      record("ZPT_400001", "SKU001", StockStatus::Low, 15, 1.5),
      record("BLK_400001", "SKU002", StockStatus::Low, 10, 1.25),
      record("BLK_400001", "SKU003", StockStatus::Full, 50, 5.0),
    ];
    let report = AreaStockReport::build(&area(), records, &Thresholds::default());

    assert_eq!(report.pincode, "400001");
    assert_eq!(report.total_products, 4);
    assert_eq!(report.oos_products, 1);
    assert_eq!(report.low_stock_products, 2);
    assert_eq!(report.stores.len(), 2);

    let blk = &report.stores[0];
    assert_eq!(blk.store_code, "BLK_400001");
    assert_eq!(blk.products.len(), 3);
    assert_eq!(blk.oos_count, 1);
    assert_eq!(blk.low_stock_count, 1);
    assert_eq!(blk.products[1].sku, "SKU002");
    assert_eq!(blk.products[1].count_band, CountBand::Low);
    assert_eq!(blk.products[2].count_band, CountBand::High);

    let zpt = report.store("ZPT_400001").unwrap();
    assert_eq!(zpt.low_stock_count, 1);
    assert_eq!(zpt.products[0].doi_alert, "Low Stock - 1.5 days remaining");
  }

  #[test]
  fn empty_area_has_no_stores() {
    let report = AreaStockReport::build(&area(), vec![], &Thresholds::default());
    assert!(report.stores.is_empty());
    assert_eq!(report.total_products, 0);
  }

  #[test]
  fn summaries_default_to_zero() {
    let mut other = area();
    other.id = 2;
    other.pincode = "201301".into();
    let counts = [AreaStatusCounts { area_id: 1, total: 24, out_of_stock: 3, low: 5 }];

    let summaries = summarize_areas(vec![area(), other], &counts);
    assert_eq!(summaries[0].total_products, 24);
    assert_eq!(summaries[0].oos_count, 3);
    assert_eq!(summaries[0].low_count, 5);
    assert_eq!(summaries[1].total_products, 0);
    assert_eq!(summaries[1].oos_count, 0);
  }
}
