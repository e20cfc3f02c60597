//! Reference catalog — areas, stores and products.
//!
//! Catalog entities are stable reference data. They are only written by
//! administrative seeding and are looked up by their natural keys (pincode,
//! store code, SKU) during reconciliation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stock::RawObservation;

// ─── Entities ────────────────────────────────────────────────────────────────

/// A geographic service zone, identified by its postal code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
  pub id:         i64,
  pub pincode:    String,
  pub city:       String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A catalog item. `avg_daily_sales` is the rate used to compute DOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id:              i64,
  pub sku:             String,
  pub name:            String,
  pub category:        String,
  pub brand:           String,
  pub avg_daily_sales: f64,
  pub created_at:      DateTime<Utc>,
}

/// The quick-commerce platform a store belongs to.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
  Blinkit,
  Zepto,
  Instamart,
  Swiggy,
}

/// A retail endpoint on one platform, belonging to exactly one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
  pub id:         i64,
  /// Natural key, e.g. `BLK_400001`.
  pub store_code: String,
  pub area_id:    i64,
  pub platform:   Platform,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Seed data ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArea {
  pub pincode: String,
  pub city:    String,
  pub name:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
  pub sku:             String,
  pub name:            String,
  pub category:        String,
  pub brand:           String,
  pub avg_daily_sales: f64,
}

/// A store to be created in the area identified by `area_pincode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStore {
  pub store_code:   String,
  pub area_pincode: String,
  pub platform:     Platform,
  pub name:         String,
}

/// One platform presence that is replicated into every seeded area.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreTemplate {
  /// Prepended to the area pincode to form the store code.
  pub code_prefix: &'static str,
  pub platform:    Platform,
  pub name:        &'static str,
}

impl StoreTemplate {
  pub fn store_code(&self, pincode: &str) -> String {
    format!("{}{pincode}", self.code_prefix)
  }
}

/// Average daily sales assumed when a product does not specify one.
pub const DEFAULT_AVG_DAILY_SALES: f64 = 10.0;

/// The fixed initial catalog ensured by [`crate::Dashboard::seed`].
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSeed {
  pub areas:           Vec<NewArea>,
  pub products:        Vec<NewProduct>,
  pub store_templates: Vec<StoreTemplate>,
}

impl CatalogSeed {
  /// Every area × template combination, in seed order.
  pub fn stores(&self) -> Vec<NewStore> {
    self
      .areas
      .iter()
      .flat_map(|area| {
        self.store_templates.iter().map(move |t| NewStore {
          store_code:   t.store_code(&area.pincode),
          area_pincode: area.pincode.clone(),
          platform:     t.platform,
          name:         format!("{} - {}", t.name, area.name),
        })
      })
      .collect()
  }
}

fn area(pincode: &str, city: &str, name: &str) -> NewArea {
  NewArea {
    pincode: pincode.to_owned(),
    city:    city.to_owned(),
    name:    name.to_owned(),
  }
}

fn product(
  sku: &str,
  name: &str,
  category: &str,
  brand: &str,
  avg_daily_sales: f64,
) -> NewProduct {
  NewProduct {
    sku: sku.to_owned(),
    name: name.to_owned(),
    category: category.to_owned(),
    brand: brand.to_owned(),
    avg_daily_sales,
  }
}

impl Default for CatalogSeed {
  fn default() -> Self {
    Self {
      areas:           vec![
        area("400001", "Mumbai", "South Mumbai"),
        area("201301", "Noida", "Sector 16"),
        area("560001", "Bangalore", "MG Road"),
      ],
      products:        vec![
        product("SKU001", "Mango Oatmeal", "Breakfast", "Quaker", DEFAULT_AVG_DAILY_SALES),
        product("SKU002", "Almond Milk 1L", "Dairy", "Alpro", 8.0),
        product("SKU003", "Organic Honey 500g", "Grocery", "Dabur", 12.0),
        product("SKU004", "Green Tea 25 Bags", "Beverages", "Lipton", 15.0),
        product("SKU005", "Whole Wheat Bread", "Bakery", "Modern", 20.0),
        product("SKU006", "Greek Yogurt 400g", "Dairy", "Epigamia", DEFAULT_AVG_DAILY_SALES),
        product("SKU007", "Dark Chocolate 100g", "Snacks", "Amul", 25.0),
        product("SKU008", "Peanut Butter 500g", "Spreads", "MyFitness", 7.0),
      ],
      store_templates: vec![
        StoreTemplate { code_prefix: "BLK_", platform: Platform::Blinkit, name: "Blinkit Store" },
        StoreTemplate { code_prefix: "ZPT_", platform: Platform::Zepto, name: "Zepto Store" },
        StoreTemplate {
          code_prefix: "ISM_",
          platform:    Platform::Instamart,
          name:        "Instamart Store",
        },
      ],
    }
  }
}

/// Rows actually inserted by a seeding run; all zero when the catalog was
/// already complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
  pub areas_inserted:    usize,
  pub products_inserted: usize,
  pub stores_inserted:   usize,
}

// ─── Per-batch index ─────────────────────────────────────────────────────────

/// Why an observation could not be matched to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
  UnknownArea(String),
  UnknownStore(String),
  UnknownProduct(String),
  /// The store exists but belongs to a different area than the one reported.
  StoreOutsideArea { store_code: String, pincode: String },
  /// Negative or non-finite price.
  InvalidPrice(f64),
}

impl std::fmt::Display for Unresolved {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::UnknownArea(p) => write!(f, "unknown area {p:?}"),
      Self::UnknownStore(s) => write!(f, "unknown store {s:?}"),
      Self::UnknownProduct(s) => write!(f, "unknown sku {s:?}"),
      Self::StoreOutsideArea { store_code, pincode } => {
        write!(f, "store {store_code:?} does not belong to area {pincode:?}")
      }
      Self::InvalidPrice(p) => write!(f, "invalid price {p}"),
    }
  }
}

/// Catalog entities an observation resolved to.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
  pub area:    &'a Area,
  pub store:   &'a Store,
  pub product: &'a Product,
}

/// In-memory lookup tables keyed by natural identifier.
///
/// Built once per reconciliation run from a full catalog load and dropped
/// when the run ends, so it can never go stale against the store.
#[derive(Debug, Default)]
pub struct CatalogIndex {
  areas:    HashMap<String, Area>,
  stores:   HashMap<String, Store>,
  products: HashMap<String, Product>,
}

impl CatalogIndex {
  pub fn build(areas: Vec<Area>, stores: Vec<Store>, products: Vec<Product>) -> Self {
    Self {
      areas:    areas.into_iter().map(|a| (a.pincode.clone(), a)).collect(),
      stores:   stores.into_iter().map(|s| (s.store_code.clone(), s)).collect(),
      products: products.into_iter().map(|p| (p.sku.clone(), p)).collect(),
    }
  }

  pub fn area(&self, pincode: &str) -> Option<&Area> { self.areas.get(pincode) }

  pub fn store(&self, store_code: &str) -> Option<&Store> { self.stores.get(store_code) }

  pub fn product(&self, sku: &str) -> Option<&Product> { self.products.get(sku) }

  /// Resolve an observation against the index, checking that the reported
  /// store actually belongs to the reported area.
  pub fn resolve(&self, obs: &RawObservation) -> Result<Resolved<'_>, Unresolved> {
    if !(obs.price.is_finite() && obs.price >= 0.0) {
      return Err(Unresolved::InvalidPrice(obs.price));
    }
    let area = self
      .area(&obs.pincode)
      .ok_or_else(|| Unresolved::UnknownArea(obs.pincode.clone()))?;
    let store = self
      .store(&obs.store_code)
      .ok_or_else(|| Unresolved::UnknownStore(obs.store_code.clone()))?;
    let product = self
      .product(&obs.sku)
      .ok_or_else(|| Unresolved::UnknownProduct(obs.sku.clone()))?;

    if store.area_id != area.id {
      return Err(Unresolved::StoreOutsideArea {
        store_code: store.store_code.clone(),
        pincode:    area.pincode.clone(),
      });
    }

    Ok(Resolved { area, store, product })
  }
}
