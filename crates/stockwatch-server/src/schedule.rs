//! Periodic refresh task.

use std::{sync::Arc, time::Duration};

use stockwatch_core::{Dashboard, Error, source::ObservationSource, store::InventoryStore};
use tokio::{
  task::JoinHandle,
  time::{MissedTickBehavior, interval},
};

/// Run [`Dashboard::refresh`] every `every`, starting immediately.
///
/// A tick that lands while a manual refresh or ingest is in flight is skipped
/// rather than queued.
pub fn spawn_refresh_loop<S, R>(
  dashboard: Arc<Dashboard<S>>,
  source: Arc<R>,
  every: Duration,
) -> JoinHandle<()>
where
  S: InventoryStore + 'static,
  R: ObservationSource + 'static,
{
  tokio::spawn(async move {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      match dashboard.refresh(&*source).await {
        Ok(report) => tracing::info!(
          received = report.received,
          saved = report.saved,
          skipped = report.skipped,
          elapsed_ms = report.elapsed_ms,
          "scheduled refresh complete",
        ),
        Err(Error::Busy) => {
          tracing::warn!("scheduled refresh skipped: a reconciliation is already running")
        }
        Err(e) => tracing::warn!(error = %e, category = e.category(), "scheduled refresh failed"),
      }
    }
  })
}
