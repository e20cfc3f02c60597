//! Operator-facing alert text: per-product DOI alerts and the WhatsApp stock
//! alert for a single store.

use std::fmt::Write as _;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::{
  report::{AreaStockReport, StoreStockSummary},
  stock::StockStatus,
};

/// One-line alert for a product's stock position.
pub fn doi_alert(doi: f64, status: StockStatus) -> String {
  match status {
    StockStatus::OutOfStock => "Out of Stock - Refill Immediately!".to_owned(),
    StockStatus::Low => format!("Low Stock - {doi} days remaining"),
    StockStatus::Full => format!("Healthy Stock - {doi} days"),
  }
}

const WHATSAPP_SHARE_URL: &str = "https://wa.me/?text=";

/// Everything outside the RFC 3986 unreserved set.
const SHARE_TEXT_ENCODE_SET: &AsciiSet =
  &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// A composed WhatsApp message for one store, ready to share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppAlert {
  pub area:       String,
  pub pincode:    String,
  pub store_code: String,
  pub store_name: String,
  /// Message body using WhatsApp `*bold*` markup.
  pub message:       String,
  /// The message without markup, for pasting into other channels.
  pub plain_message: String,
  /// `wa.me` link that opens WhatsApp with the message prefilled.
  pub share_url:     String,
}

impl WhatsAppAlert {
  pub fn compose(report: &AreaStockReport, store: &StoreStockSummary) -> Self {
    let message = compose_message(&report.area, &report.pincode, store);
    let share_url = format!(
      "{WHATSAPP_SHARE_URL}{}",
      utf8_percent_encode(&message, SHARE_TEXT_ENCODE_SET)
    );
    Self {
      area: report.area.clone(),
      pincode: report.pincode.clone(),
      store_code: store.store_code.clone(),
      store_name: store.store_name.clone(),
      plain_message: message.replace('*', ""),
      message,
      share_url,
    }
  }
}

fn compose_message(area: &str, pincode: &str, store: &StoreStockSummary) -> String {
  let oos: Vec<_> = store
    .products
    .iter()
    .filter(|p| p.status == StockStatus::OutOfStock)
    .collect();
  let low: Vec<_> = store
    .products
    .iter()
    .filter(|p| p.status == StockStatus::Low)
    .collect();

  let mut msg = String::new();
  // Writing into a String cannot fail.
  let _ = writeln!(msg, "🚨 *STOCK ALERT* 🚨");
  let _ = writeln!(msg);
  let _ = writeln!(msg, "*Area:* {area} ({pincode})");
  let _ = writeln!(msg, "*Store:* {}", store.store_name);
  let _ = writeln!(msg, "*Platform:* {}", store.platform);
  let _ = writeln!(msg);
  let _ = writeln!(msg, "📊 *Summary:*");
  let _ = writeln!(msg, "• Out of Stock: {} products", oos.len());
  let _ = writeln!(msg, "• Low Stock: {} products", low.len());
  let _ = writeln!(msg);

  if !oos.is_empty() {
    let _ = writeln!(msg, "⛔ *Out of Stock Products:*");
    for p in &oos {
      let _ = writeln!(msg, "  • {} ({})", p.name, p.sku);
    }
    let _ = writeln!(msg);
  }

  if !low.is_empty() {
    let _ = writeln!(msg, "⚠️ *Low Stock Products:*");
    for p in &low {
      let _ = writeln!(msg, "  • {} ({}) - {} days remaining", p.name, p.sku, p.doi.ceil());
    }
    let _ = writeln!(msg);
  }

  msg.push_str("🔔 *Action Required:* Refill stock immediately!");
  msg
}
