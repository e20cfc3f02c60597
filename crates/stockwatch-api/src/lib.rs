//! JSON HTTP API for Stockwatch.
//!
//! Exposes an axum [`Router`] over a [`Dashboard`] backed by any
//! [`InventoryStore`], with an [`ObservationSource`] for manual refreshes.
//! Mutating endpoints require HTTP Basic admin auth when credentials are
//! configured; TLS and scheduling are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = stockwatch_api::api_router(AppState::new(dashboard, source));
//! axum::serve(listener, app).await?;
//! ```

pub mod alerts;
pub mod areas;
pub mod auth;
pub mod debug;
pub mod error;
pub mod scraper;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use stockwatch_core::{Dashboard, source::ObservationSource, store::InventoryStore};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, R> {
  pub dashboard: Arc<Dashboard<S>>,
  /// Source pulled by `POST /scraper/run`.
  pub source:    Arc<R>,
  /// Admin credentials; `None` leaves the mutating endpoints open.
  pub auth:      Option<Arc<AuthConfig>>,
}

impl<S, R> AppState<S, R> {
  pub fn new(dashboard: Arc<Dashboard<S>>, source: Arc<R>) -> Self {
    Self { dashboard, source, auth: None }
  }

  pub fn with_auth(mut self, auth: AuthConfig) -> Self {
    self.auth = Some(Arc::new(auth));
    self
  }
}

// Manual impl: deriving would demand `S: Clone` and `R: Clone`.
impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      dashboard: self.dashboard.clone(),
      source:    self.source.clone(),
      auth:      self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be served directly or nested into a parent
/// router regardless of its own state type.
pub fn api_router<S, R>(state: AppState<S, R>) -> Router<()>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  Router::new()
    // Reads
    .route("/areas", get(areas::list::<S, R>))
    .route("/stock", get(areas::stock::<S, R>))
    .route("/alerts/whatsapp", get(alerts::whatsapp::<S, R>))
    .route("/debug", get(debug::counts::<S, R>))
    // Writes
    .route("/ingest", post(scraper::ingest::<S, R>))
    .route("/scraper/init", post(scraper::init::<S, R>))
    .route("/scraper/run", post(scraper::run::<S, R>))
    .route("/scraper/status", get(scraper::status::<S, R>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
