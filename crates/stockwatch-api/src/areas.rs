//! Handlers for the read-side area endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/areas` | Every area with status tallies |
//! | `GET`  | `/stock` | `?area=<pincode>`; 400 if missing, 404 if unknown |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use stockwatch_core::{
  Error,
  report::{AreaStockReport, AreaSummary},
  source::ObservationSource,
  store::InventoryStore,
};

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AreaList {
  pub areas: Vec<AreaSummary>,
  pub count: usize,
}

/// `GET /areas`
pub async fn list<S, R>(State(state): State<AppState<S, R>>) -> Result<Json<AreaList>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  let areas = state.dashboard.list_areas_summary().await?;
  let count = areas.len();
  Ok(Json(AreaList { areas, count }))
}

// ─── Stock ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StockParams {
  pub area: Option<String>,
}

/// Pull a required, non-blank query parameter.
pub(crate) fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("query parameter `{name}` is required")))
}

/// `GET /stock?area=<pincode>`
pub async fn stock<S, R>(
  State(state): State<AppState<S, R>>,
  params: Result<Query<StockParams>, QueryRejection>,
) -> Result<Json<AreaStockReport>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  let Query(params) = params?;
  let pincode = required(params.area, "area")?;
  let report = state
    .dashboard
    .query_area(&pincode)
    .await?
    .ok_or(Error::AreaNotFound(pincode))?;
  Ok(Json(report))
}
