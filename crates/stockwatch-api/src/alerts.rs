//! `GET /alerts/whatsapp?area=<pincode>&store=<code>`

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use stockwatch_core::{
  alert::WhatsAppAlert,
  source::ObservationSource,
  store::InventoryStore,
};

use crate::{AppState, areas::required, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AlertParams {
  pub area:  Option<String>,
  pub store: Option<String>,
}

pub async fn whatsapp<S, R>(
  State(state): State<AppState<S, R>>,
  params: Result<Query<AlertParams>, QueryRejection>,
) -> Result<Json<WhatsAppAlert>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  let Query(params) = params?;
  let pincode = required(params.area, "area")?;
  let store_code = required(params.store, "store")?;
  let alert = state.dashboard.store_alert(&pincode, &store_code).await?;
  Ok(Json(alert))
}
