//! [`SqliteStore`] — the SQLite implementation of [`InventoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use stockwatch_core::{
  catalog::{Area, CatalogSeed, Product, SeedReport, Store},
  stock::{AreaStatusCounts, NewStockFact, StockRecord, TableCounts},
  store::InventoryStore,
};

use crate::{
  Result,
  encode::{RawArea, RawProduct, RawStockRecord, RawStore, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An inventory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Encoded column values of one stock fact, ready to bind.
struct FactRow {
  product_id:  i64,
  store_id:    i64,
  area_id:     i64,
  status:      String,
  stock_count: u32,
  price:       f64,
  doi:         f64,
  observed_at: String,
}

impl From<&NewStockFact> for FactRow {
  fn from(f: &NewStockFact) -> Self {
    Self {
      product_id:  f.product_id,
      store_id:    f.store_id,
      area_id:     f.area_id,
      status:      f.status.as_ref().to_owned(),
      stock_count: f.stock_count,
      price:       f.price,
      doi:         f.doi,
      observed_at: encode_dt(f.observed_at),
    }
  }
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<SeedReport> {
    let areas      = seed.areas.clone();
    let products   = seed.products.clone();
    let stores     = seed.stores();
    let created_at = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut report = SeedReport::default();
        {
          let mut stmt = tx.prepare(
            "INSERT INTO areas (pincode, city, name, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (pincode) DO NOTHING",
          )?;
          for a in &areas {
            report.areas_inserted +=
              stmt.execute(rusqlite::params![a.pincode, a.city, a.name, created_at])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO products (sku, name, category, brand, avg_daily_sales, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (sku) DO NOTHING",
          )?;
          for p in &products {
            report.products_inserted += stmt.execute(rusqlite::params![
              p.sku,
              p.name,
              p.category,
              p.brand,
              p.avg_daily_sales,
              created_at,
            ])?;
          }

          // Stores attach to their area by pincode; a store whose area is
          // missing selects no row and is silently not created.
          let mut stmt = tx.prepare(
            "INSERT INTO stores (store_code, area_id, platform, name, created_at)
             SELECT ?1, area_id, ?3, ?4, ?5 FROM areas WHERE pincode = ?2
             ON CONFLICT (store_code) DO NOTHING",
          )?;
          for s in &stores {
            report.stores_inserted += stmt.execute(rusqlite::params![
              s.store_code,
              s.area_pincode,
              s.platform.as_ref(),
              s.name,
              created_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(report)
      })
      .await?;

    Ok(report)
  }

  async fn find_area(&self, pincode: &str) -> Result<Option<Area>> {
    let pincode = pincode.to_owned();

    let raw: Option<RawArea> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM areas WHERE pincode = ?1", RawArea::COLUMNS),
            rusqlite::params![pincode],
            RawArea::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawArea::into_area).transpose()
  }

  async fn find_store(&self, store_code: &str) -> Result<Option<Store>> {
    let store_code = store_code.to_owned();

    let raw: Option<RawStore> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM stores WHERE store_code = ?1", RawStore::COLUMNS),
            rusqlite::params![store_code],
            |row| RawStore::from_row_at(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStore::into_store).transpose()
  }

  async fn find_product(&self, sku: &str) -> Result<Option<Product>> {
    let sku = sku.to_owned();

    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM products WHERE sku = ?1", RawProduct::COLUMNS),
            rusqlite::params![sku],
            |row| RawProduct::from_row_at(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn list_areas(&self) -> Result<Vec<Area>> {
    let raws: Vec<RawArea> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM areas ORDER BY area_id",
          RawArea::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawArea::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArea::into_area).collect()
  }

  async fn list_stores(&self) -> Result<Vec<Store>> {
    let raws: Vec<RawStore> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM stores ORDER BY store_id",
          RawStore::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], |row| RawStore::from_row_at(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStore::into_store).collect()
  }

  async fn list_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM products ORDER BY product_id",
          RawProduct::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], |row| RawProduct::from_row_at(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  // ── Snapshot ──────────────────────────────────────────────────────────────

  async fn replace_stock_facts(&self, facts: Vec<NewStockFact>) -> Result<usize> {
    let rows: Vec<FactRow> = facts.iter().map(FactRow::from).collect();

    let inserted = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without committing rolls both statements back.
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM stock_facts", [])?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO stock_facts (
               product_id, store_id, area_id, status,
               stock_count, price, doi, observed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for r in &rows {
            inserted += stmt.execute(rusqlite::params![
              r.product_id,
              r.store_id,
              r.area_id,
              r.status,
              r.stock_count,
              r.price,
              r.doi,
              r.observed_at,
            ])?;
          }
        }
        tx.commit()?;
        tracing::debug!(removed, inserted, "stock_facts replaced");
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn stock_for_area(&self, area_id: i64) -> Result<Vec<StockRecord>> {
    let raws: Vec<RawStockRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {}
           FROM stock_facts f
           JOIN products p ON p.product_id = f.product_id
           JOIN stores   s ON s.store_id   = f.store_id
           WHERE f.area_id = ?1
           ORDER BY f.observed_at DESC, f.fact_id ASC",
          RawStockRecord::SELECT
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![area_id], RawStockRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStockRecord::into_record).collect()
  }

  async fn status_counts_by_area(&self) -> Result<Vec<AreaStatusCounts>> {
    let rows: Vec<(i64, i64, i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT area_id,
                  COUNT(*),
                  SUM(status = 'out_of_stock'),
                  SUM(status = 'low')
           FROM stock_facts
           GROUP BY area_id
           ORDER BY area_id",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(area_id, total, oos, low)| AreaStatusCounts {
          area_id,
          total:        total as usize,
          out_of_stock: oos as usize,
          low:          low as usize,
        })
        .collect(),
    )
  }

  async fn table_counts(&self) -> Result<TableCounts> {
    let (areas, stores, products, stock_facts): (i64, i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM areas),
                  (SELECT COUNT(*) FROM stores),
                  (SELECT COUNT(*) FROM products),
                  (SELECT COUNT(*) FROM stock_facts)",
          [],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?)
      })
      .await?;

    Ok(TableCounts {
      areas:       areas as usize,
      stores:      stores as usize,
      products:    products as usize,
      stock_facts: stock_facts as usize,
    })
  }
}
