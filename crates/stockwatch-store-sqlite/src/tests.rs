//! Integration tests for `SqliteStore` and the core pipeline against an
//! in-memory database.

use std::{convert::Infallible, future::Future, sync::Arc};

use chrono::{Duration, Utc};
use stockwatch_core::{
  Dashboard, Error,
  calc::Thresholds,
  catalog::{CatalogSeed, Platform},
  source::{MockSource, ObservationSource},
  stock::{NewStockFact, RawObservation, StockStatus},
  store::InventoryStore,
};
use tokio::sync::Notify;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seeded() -> Dashboard<SqliteStore> {
  let dash = Dashboard::new(Arc::new(store().await), Thresholds::default());
  dash.seed().await.expect("seed");
  dash
}

fn obs(pincode: &str, store_code: &str, sku: &str, stock_count: u32) -> RawObservation {
  RawObservation::new(pincode, store_code, sku, stock_count, 199.0)
}

/// Every store of area 400001 reporting every SKU with the given count.
fn full_sweep_400001(stock_count: u32) -> Vec<RawObservation> {
  let mut batch = Vec::new();
  for store_code in ["BLK_400001", "ZPT_400001", "ISM_400001"] {
    for n in 1..=8 {
      batch.push(obs("400001", store_code, &format!("SKU00{n}"), stock_count));
    }
  }
  batch
}

// ─── Seeding and catalog ─────────────────────────────────────────────────────

#[tokio::test]
async fn seed_populates_catalog() {
  let dash = Dashboard::new(Arc::new(store().await), Thresholds::default());
  let report = dash.seed().await.unwrap();
  assert_eq!(report.areas_inserted, 3);
  assert_eq!(report.products_inserted, 8);
  assert_eq!(report.stores_inserted, 9);

  let counts = dash.table_counts().await.unwrap();
  assert_eq!(counts.areas, 3);
  assert_eq!(counts.products, 8);
  assert_eq!(counts.stores, 9);
  assert_eq!(counts.stock_facts, 0);
}

#[tokio::test]
async fn seed_is_idempotent() {
  let dash = seeded().await;
  let before = (
    dash.store().list_areas().await.unwrap(),
    dash.store().list_stores().await.unwrap(),
    dash.store().list_products().await.unwrap(),
  );

  let second = dash.seed().await.unwrap();
  assert_eq!(second.areas_inserted, 0);
  assert_eq!(second.products_inserted, 0);
  assert_eq!(second.stores_inserted, 0);

  let after = (
    dash.store().list_areas().await.unwrap(),
    dash.store().list_stores().await.unwrap(),
    dash.store().list_products().await.unwrap(),
  );
  assert_eq!(before, after);
}

#[tokio::test]
async fn seed_never_overwrites_existing_rows() {
  let s = store().await;
  let mut custom = CatalogSeed::default();
  custom.products.truncate(1);
  custom.products[0].avg_daily_sales = 4.0;
  s.seed_catalog(&custom).await.unwrap();

  s.seed_catalog(&CatalogSeed::default()).await.unwrap();
  let p = s.find_product("SKU001").await.unwrap().unwrap();
  assert_eq!(p.avg_daily_sales, 4.0);
  assert_eq!(s.list_products().await.unwrap().len(), 8);
}

#[tokio::test]
async fn catalog_lookups_by_natural_key() {
  let dash = seeded().await;
  let s = dash.store();

  let area = s.find_area("400001").await.unwrap().unwrap();
  assert_eq!(area.name, "South Mumbai");
  assert_eq!(area.city, "Mumbai");

  let st = s.find_store("ZPT_560001").await.unwrap().unwrap();
  assert_eq!(st.platform, Platform::Zepto);
  assert_eq!(st.name, "Zepto Store - MG Road");
  let mg_road = s.find_area("560001").await.unwrap().unwrap();
  assert_eq!(st.area_id, mg_road.id);

  let p = s.find_product("SKU004").await.unwrap().unwrap();
  assert_eq!(p.avg_daily_sales, 15.0);

  assert!(s.find_area("000000").await.unwrap().is_none());
  assert!(s.find_store("XYZ_1").await.unwrap().is_none());
  assert!(s.find_product("SKU999").await.unwrap().is_none());
}

// ─── End-to-end scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn empty_shelf_is_out_of_stock() {
  let dash = seeded().await;
  let report = dash
    .ingest(vec![obs("400001", "BLK_400001", "SKU001", 0)])
    .await
    .unwrap();
  assert_eq!(report.saved, 1);
  assert_eq!(report.skipped, 0);

  let area = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(area.area, "South Mumbai");
  assert_eq!(area.stores.len(), 1);
  assert_eq!(area.stores[0].oos_count, 1);
  assert_eq!(area.total_products, 1);
  assert_eq!(area.oos_products, 1);

  let product = &area.stores[0].products[0];
  assert_eq!(product.status, StockStatus::OutOfStock);
  assert_eq!(product.doi, 0.0);
  assert_eq!(product.price, 199.0);
}

#[tokio::test]
async fn doi_drives_low_and_full() {
  let dash = seeded().await;

  dash.ingest(vec![obs("400001", "BLK_400001", "SKU001", 15)]).await.unwrap();
  let area = dash.query_area("400001").await.unwrap().unwrap();
  let product = &area.stores[0].products[0];
  assert_eq!(product.doi, 1.5);
  assert_eq!(product.status, StockStatus::Low);
  assert_eq!(area.low_stock_products, 1);

  dash.ingest(vec![obs("400001", "BLK_400001", "SKU001", 50)]).await.unwrap();
  let area = dash.query_area("400001").await.unwrap().unwrap();
  let product = &area.stores[0].products[0];
  assert_eq!(product.doi, 5.0);
  assert_eq!(product.status, StockStatus::Full);
  assert_eq!(area.low_stock_products, 0);
  assert_eq!(area.total_products, 1);
}

#[tokio::test]
async fn zero_sales_rate_is_out_of_stock() {
  let s = store().await;
  let mut seed = CatalogSeed::default();
  seed.products[0].avg_daily_sales = 0.0;
  s.seed_catalog(&seed).await.unwrap();
  let dash = Dashboard::new(Arc::new(s), Thresholds::default());

  dash.ingest(vec![obs("400001", "BLK_400001", "SKU001", 40)]).await.unwrap();
  let area = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(area.stores[0].products[0].doi, 0.0);
  assert_eq!(area.stores[0].products[0].status, StockStatus::OutOfStock);
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn every_resolved_observation_is_saved() {
  let dash = seeded().await;
  let batch = full_sweep_400001(30);
  let n = batch.len();

  let report = dash.ingest(batch).await.unwrap();
  assert_eq!(report.saved, n);
  assert_eq!(report.skipped, 0);
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, n);

  let area = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(area.total_products, n);
  assert_eq!(area.stores.len(), 3);
  assert!(area.stores.iter().all(|s| s.products.len() == 8));
}

#[tokio::test]
async fn unknown_keys_are_skipped_not_fatal() {
  let dash = seeded().await;
  let batch = vec![
    obs("400001", "BLK_400001", "SKU001", 5),
    obs("400001", "BLK_400001", "SKU999", 5),
    obs("400001", "ZPT_400001", "SKU002", 5),
  ];

  let report = dash.ingest(batch).await.unwrap();
  assert_eq!(report.saved, 2);
  assert_eq!(report.skipped, 1);

  let batch = vec![
    obs("999999", "BLK_400001", "SKU001", 5),
    obs("400001", "NOPE_1", "SKU001", 5),
    // Known store reported under the wrong area.
    obs("201301", "BLK_400001", "SKU001", 5),
    obs("201301", "BLK_201301", "SKU003", 5),
  ];
  let report = dash.ingest(batch).await.unwrap();
  assert_eq!(report.saved, 1);
  assert_eq!(report.skipped, 3);
}

#[tokio::test]
async fn ingest_replaces_previous_snapshot() {
  let dash = seeded().await;
  dash.ingest(full_sweep_400001(50)).await.unwrap();
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 24);

  dash
    .ingest(vec![obs("201301", "BLK_201301", "SKU001", 0)])
    .await
    .unwrap();

  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 1);
  let mumbai = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(mumbai.total_products, 0);
  assert!(mumbai.stores.is_empty());
  let noida = dash.query_area("201301").await.unwrap().unwrap();
  assert_eq!(noida.oos_products, 1);
}

#[tokio::test]
async fn empty_batch_empties_snapshot() {
  let dash = seeded().await;
  dash.ingest(full_sweep_400001(50)).await.unwrap();

  let report = dash.ingest(vec![]).await.unwrap();
  assert_eq!(report.saved, 0);
  assert_eq!(report.skipped, 0);
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 0);
}

#[tokio::test]
async fn failed_replacement_keeps_previous_snapshot() {
  let dash = seeded().await;
  dash.ingest(full_sweep_400001(50)).await.unwrap();

  let area = dash.store().find_area("400001").await.unwrap().unwrap();
  let st = dash.store().find_store("BLK_400001").await.unwrap().unwrap();
  let good = NewStockFact {
    product_id:  1,
    store_id:    st.id,
    area_id:     area.id,
    status:      StockStatus::Full,
    stock_count: 10,
    price:       99.0,
    doi:         1.0,
    observed_at: Utc::now(),
  };
  // Violates the product foreign key after the delete has already run.
  let dangling = NewStockFact { product_id: 9_999, ..good.clone() };

  let result = dash.store().replace_stock_facts(vec![good, dangling]).await;
  assert!(result.is_err());

  let counts = dash.table_counts().await.unwrap();
  assert_eq!(counts.stock_facts, 24);
  let report = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(report.total_products, 24);
  assert!(report.stores.iter().flat_map(|s| &s.products).all(|p| p.stock_count == 50));
}

#[tokio::test]
async fn records_are_newest_first() {
  let dash = seeded().await;
  let now = Utc::now();
  let mut older = obs("400001", "BLK_400001", "SKU001", 30);
  older.observed_at = now - Duration::minutes(10);
  let mut newer = obs("400001", "ZPT_400001", "SKU002", 30);
  newer.observed_at = now;
  let mut middle = obs("400001", "BLK_400001", "SKU003", 30);
  middle.observed_at = now - Duration::minutes(5);

  dash.ingest(vec![older, newer, middle]).await.unwrap();

  let area = dash.store().find_area("400001").await.unwrap().unwrap();
  let records = dash.store().stock_for_area(area.id).await.unwrap();
  let skus: Vec<_> = records.iter().map(|r| r.product.sku.as_str()).collect();
  assert_eq!(skus, ["SKU002", "SKU003", "SKU001"]);
  assert_eq!(records[0].store.store_code, "ZPT_400001");

  // Grouping keeps the first-seen store order.
  let report = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(report.stores[0].store_code, "ZPT_400001");
  assert_eq!(report.stores[1].products[0].sku, "SKU003");
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_area_is_none() {
  let dash = seeded().await;
  assert!(dash.query_area("000000").await.unwrap().is_none());
}

#[tokio::test]
async fn area_summaries_count_by_status() {
  let dash = seeded().await;
  dash
    .ingest(vec![
      obs("400001", "BLK_400001", "SKU001", 0),
      obs("400001", "BLK_400001", "SKU002", 10),
      obs("400001", "ZPT_400001", "SKU003", 100),
      obs("201301", "ISM_201301", "SKU004", 0),
    ])
    .await
    .unwrap();

  let summaries = dash.list_areas_summary().await.unwrap();
  assert_eq!(summaries.len(), 3);

  let mumbai = summaries.iter().find(|s| s.area.pincode == "400001").unwrap();
  assert_eq!(mumbai.total_products, 3);
  assert_eq!(mumbai.oos_count, 1);
  assert_eq!(mumbai.low_count, 1);

  let noida = summaries.iter().find(|s| s.area.pincode == "201301").unwrap();
  assert_eq!((noida.total_products, noida.oos_count, noida.low_count), (1, 1, 0));

  let bangalore = summaries.iter().find(|s| s.area.pincode == "560001").unwrap();
  assert_eq!(bangalore.total_products, 0);
}

#[tokio::test]
async fn whatsapp_alert_for_store() {
  let dash = seeded().await;
  dash
    .ingest(vec![
      obs("400001", "BLK_400001", "SKU001", 0),
      obs("400001", "BLK_400001", "SKU002", 10),
    ])
    .await
    .unwrap();

  let alert = dash.store_alert("400001", "BLK_400001").await.unwrap();
  assert!(alert.message.contains("Mango Oatmeal (SKU001)"));
  assert!(alert.message.contains("Almond Milk 1L (SKU002) - 2 days remaining"));

  assert!(matches!(
    dash.store_alert("000000", "BLK_400001").await,
    Err(Error::AreaNotFound(_))
  ));
  assert!(matches!(
    dash.store_alert("400001", "ZPT_400001").await,
    Err(Error::StoreNotFound(_))
  ));
}

// ─── Refresh and concurrency ─────────────────────────────────────────────────

#[tokio::test]
async fn refresh_seeds_empty_catalog_and_ingests_mock_sweep() {
  let dash = Dashboard::new(Arc::new(store().await), Thresholds::default())
    .with_refresh_interval(Some(std::time::Duration::from_secs(300)));
  let source = MockSource::new(CatalogSeed::default());

  let report = dash.refresh(&source).await.unwrap();
  let seeded = report.seeded.expect("first refresh seeds");
  assert_eq!(seeded.areas_inserted, 3);
  assert_eq!(report.received, 72);
  assert_eq!(report.saved, 72);
  assert_eq!(report.skipped, 0);

  let status = dash.status();
  assert!(!status.running);
  assert_eq!(status.last_run, Some(report.completed_at));
  assert_eq!(status.next_run, Some(report.completed_at + Duration::seconds(300)));

  let again = dash.refresh(&source).await.unwrap();
  assert!(again.seeded.is_none());
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 72);
}

#[tokio::test]
async fn ingest_is_rejected_while_flight_is_held() {
  let dash = seeded().await;
  dash.ingest(full_sweep_400001(50)).await.unwrap();

  let held = dash.reconciler().flight().try_acquire().unwrap();
  let result = dash.ingest(vec![obs("400001", "BLK_400001", "SKU001", 0)]).await;
  assert!(matches!(result, Err(Error::Busy)));
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 24);

  drop(held);
  dash
    .ingest(vec![obs("400001", "BLK_400001", "SKU001", 0)])
    .await
    .unwrap();
  assert_eq!(dash.table_counts().await.unwrap().stock_facts, 1);
}

/// A source that blocks until released, so a refresh can be held mid-flight.
struct GatedSource {
  gate:  Arc<Notify>,
  batch: Vec<RawObservation>,
}

impl ObservationSource for GatedSource {
  type Error = Infallible;

  fn produce(
    &self,
  ) -> impl Future<Output = Result<Vec<RawObservation>, Self::Error>> + Send + '_ {
    async move {
      self.gate.notified().await;
      Ok(self.batch.clone())
    }
  }
}

#[tokio::test]
async fn trigger_while_refresh_is_producing_gets_busy() {
  let dash = seeded().await;
  dash.ingest(full_sweep_400001(50)).await.unwrap();

  let gate = Arc::new(Notify::new());
  let source = GatedSource {
    gate:  gate.clone(),
    batch: vec![obs("400001", "BLK_400001", "SKU001", 0)],
  };

  let (refreshed, contender) = tokio::join!(dash.refresh(&source), async {
    while !dash.status().running {
      tokio::task::yield_now().await;
    }
    // The source is still blocked, so the replacement has not started yet;
    // rollback of a replacement is covered by
    // `failed_replacement_keeps_previous_snapshot`.
    let during = dash.query_area("400001").await.unwrap().unwrap();
    let busy = dash.ingest(full_sweep_400001(0)).await;
    gate.notify_one();
    (during.total_products, busy)
  });

  let (seen_during, busy) = contender;
  assert_eq!(seen_during, 24);
  assert!(matches!(busy, Err(Error::Busy)));

  let refreshed = refreshed.unwrap();
  assert_eq!(refreshed.saved, 1);
  let after = dash.query_area("400001").await.unwrap().unwrap();
  assert_eq!(after.total_products, 1);
  assert_eq!(after.oos_products, 1);
}
