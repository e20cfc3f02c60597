//! Handlers that write the snapshot or report on its refreshes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ingest` | Body: JSON array of observations; 409 while busy |
//! | `POST` | `/scraper/init` | Seed the reference catalog |
//! | `POST` | `/scraper/run` | Pull from the configured source; 409 while busy |
//! | `GET`  | `/scraper/status` | Running flag, last and next run |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use stockwatch_core::{
  catalog::SeedReport,
  dashboard::{RefreshReport, RefreshStatus},
  ingest::IngestReport,
  source::ObservationSource,
  stock::RawObservation,
  store::InventoryStore,
};

use crate::{AppState, auth::Admin, error::ApiError};

/// `POST /ingest`
pub async fn ingest<S, R>(
  _: Admin,
  State(state): State<AppState<S, R>>,
  body: Result<Json<Vec<RawObservation>>, JsonRejection>,
) -> Result<Json<IngestReport>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  let Json(batch) = body?;
  Ok(Json(state.dashboard.ingest(batch).await?))
}

/// `POST /scraper/init`
pub async fn init<S, R>(
  _: Admin,
  State(state): State<AppState<S, R>>,
) -> Result<Json<SeedReport>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  Ok(Json(state.dashboard.seed().await?))
}

/// `POST /scraper/run`
pub async fn run<S, R>(
  _: Admin,
  State(state): State<AppState<S, R>>,
) -> Result<Json<RefreshReport>, ApiError>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  Ok(Json(state.dashboard.refresh(&*state.source).await?))
}

/// `GET /scraper/status`
pub async fn status<S, R>(State(state): State<AppState<S, R>>) -> Json<RefreshStatus>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  Json(state.dashboard.status())
}
