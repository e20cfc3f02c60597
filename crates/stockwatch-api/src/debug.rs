//! `GET /debug`: row counts of every collection.

use axum::{Json, extract::State};
use stockwatch_core::{source::ObservationSource, stock::TableCounts, store::InventoryStore};

use crate::{AppState, error::ApiError};

pub async fn counts<S, R>(State(state): State<AppState<S, R>>) -> Result<Json<TableCounts>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  Ok(Json(state.dashboard.table_counts().await?))
}
