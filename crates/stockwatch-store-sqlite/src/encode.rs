//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Enumerations are stored as their lowercase/snake_case names.

use chrono::{DateTime, SecondsFormat, Utc};
use stockwatch_core::{
  catalog::{Area, Platform, Product, Store},
  stock::{StockFact, StockRecord, StockStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_platform(s: &str) -> Result<Platform> {
  s.parse().map_err(|_| Error::UnknownVariant {
    column: "platform",
    value:  s.to_owned(),
  })
}

pub fn decode_status(s: &str) -> Result<StockStatus> {
  s.parse().map_err(|_| Error::UnknownVariant {
    column: "status",
    value:  s.to_owned(),
  })
}

fn decode_count(value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::OutOfRange { column: "stock_count", value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `areas` row.
pub struct RawArea {
  pub area_id:    i64,
  pub pincode:    String,
  pub city:       String,
  pub name:       String,
  pub created_at: String,
}

impl RawArea {
  pub const COLUMNS: &'static str = "area_id, pincode, city, name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      area_id:    row.get(0)?,
      pincode:    row.get(1)?,
      city:       row.get(2)?,
      name:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_area(self) -> Result<Area> {
    Ok(Area {
      id:         self.area_id,
      pincode:    self.pincode,
      city:       self.city,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub product_id:      i64,
  pub sku:             String,
  pub name:            String,
  pub category:        String,
  pub brand:           String,
  pub avg_daily_sales: f64,
  pub created_at:      String,
}

impl RawProduct {
  pub const COLUMNS: &'static str =
    "product_id, sku, name, category, brand, avg_daily_sales, created_at";

  /// Read the product columns starting at `offset`.
  pub fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:      row.get(offset)?,
      sku:             row.get(offset + 1)?,
      name:            row.get(offset + 2)?,
      category:        row.get(offset + 3)?,
      brand:           row.get(offset + 4)?,
      avg_daily_sales: row.get(offset + 5)?,
      created_at:      row.get(offset + 6)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      id:              self.product_id,
      sku:             self.sku,
      name:            self.name,
      category:        self.category,
      brand:           self.brand,
      avg_daily_sales: self.avg_daily_sales,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `stores` row.
pub struct RawStore {
  pub store_id:   i64,
  pub store_code: String,
  pub area_id:    i64,
  pub platform:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawStore {
  pub const COLUMNS: &'static str = "store_id, store_code, area_id, platform, name, created_at";

  /// Read the store columns starting at `offset`.
  pub fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      store_id:   row.get(offset)?,
      store_code: row.get(offset + 1)?,
      area_id:    row.get(offset + 2)?,
      platform:   row.get(offset + 3)?,
      name:       row.get(offset + 4)?,
      created_at: row.get(offset + 5)?,
    })
  }

  pub fn into_store(self) -> Result<Store> {
    Ok(Store {
      id:         self.store_id,
      store_code: self.store_code,
      area_id:    self.area_id,
      platform:   decode_platform(&self.platform)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values of a `stock_facts` row joined with its product and store.
pub struct RawStockRecord {
  // stock_facts columns
  pub fact_id:     i64,
  pub product_id:  i64,
  pub store_id:    i64,
  pub area_id:     i64,
  pub status:      String,
  pub stock_count: i64,
  pub price:       f64,
  pub doi:         f64,
  pub observed_at: String,
  // joins
  pub product:     RawProduct,
  pub store:       RawStore,
}

impl RawStockRecord {
  /// Columns in the order [`from_row`](Self::from_row) expects, with the
  /// fact table aliased `f`, products `p` and stores `s`.
  pub const SELECT: &'static str = "
    f.fact_id, f.product_id, f.store_id, f.area_id, f.status,
    f.stock_count, f.price, f.doi, f.observed_at,
    p.product_id, p.sku, p.name, p.category, p.brand, p.avg_daily_sales, p.created_at,
    s.store_id, s.store_code, s.area_id, s.platform, s.name, s.created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fact_id:     row.get(0)?,
      product_id:  row.get(1)?,
      store_id:    row.get(2)?,
      area_id:     row.get(3)?,
      status:      row.get(4)?,
      stock_count: row.get(5)?,
      price:       row.get(6)?,
      doi:         row.get(7)?,
      observed_at: row.get(8)?,
      product:     RawProduct::from_row_at(row, 9)?,
      store:       RawStore::from_row_at(row, 16)?,
    })
  }

  pub fn into_record(self) -> Result<StockRecord> {
    let fact = StockFact {
      id:          self.fact_id,
      product_id:  self.product_id,
      store_id:    self.store_id,
      area_id:     self.area_id,
      status:      decode_status(&self.status)?,
      stock_count: decode_count(self.stock_count)?,
      price:       self.price,
      doi:         self.doi,
      observed_at: decode_dt(&self.observed_at)?,
    };

    Ok(StockRecord {
      fact,
      product: self.product.into_product()?,
      store: self.store.into_store()?,
    })
  }
}
