//! SQL schema for the Stockwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS areas (
    area_id    INTEGER PRIMARY KEY,
    pincode    TEXT NOT NULL UNIQUE,
    city       TEXT NOT NULL,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id      INTEGER PRIMARY KEY,
    sku             TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    category        TEXT NOT NULL,
    brand           TEXT NOT NULL,
    avg_daily_sales REAL NOT NULL DEFAULT 10,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stores (
    store_id   INTEGER PRIMARY KEY,
    store_code TEXT NOT NULL UNIQUE,   -- e.g. BLK_400001
    area_id    INTEGER NOT NULL REFERENCES areas(area_id),
    platform   TEXT NOT NULL
               CHECK (platform IN ('blinkit', 'zepto', 'instamart', 'swiggy')),
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Holds exactly one ingestion batch. Replaced wholesale inside a single
-- transaction; rows are never updated.
CREATE TABLE IF NOT EXISTS stock_facts (
    fact_id     INTEGER PRIMARY KEY,
    product_id  INTEGER NOT NULL REFERENCES products(product_id),
    store_id    INTEGER NOT NULL REFERENCES stores(store_id),
    area_id     INTEGER NOT NULL REFERENCES areas(area_id),
    status      TEXT NOT NULL CHECK (status IN ('full', 'low', 'out_of_stock')),
    stock_count INTEGER NOT NULL CHECK (stock_count >= 0),
    price       REAL NOT NULL CHECK (price >= 0),
    doi         REAL NOT NULL CHECK (doi >= 0),
    observed_at TEXT NOT NULL          -- RFC 3339 UTC, fixed width
);

CREATE INDEX IF NOT EXISTS stores_area_idx       ON stores(area_id);
CREATE INDEX IF NOT EXISTS stock_facts_area_idx  ON stock_facts(area_id, observed_at);

PRAGMA user_version = 1;
";
