use crate::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Starts the periodic spreadsheet sync when `sync.interval_secs` is set and
/// the Google credentials are present. The first run happens immediately.
pub fn spawn_periodic_sync(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let secs = state.config.sync.interval_secs?;
    if let Err(e) = state.secrets.require_google() {
        tracing::warn!(
            error = %e,
            "Periodic sync is configured but credentials are missing; not starting it."
        );
        return None;
    }

    tracing::info!(interval_secs = secs, "Starting periodic spreadsheet sync.");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sheet_sync::sync_from_config(&state.config.sync, &state.secrets, &state.db_repo)
                .await
            {
                Ok(report) => tracing::info!(
                    fetched = report.rows_fetched,
                    upserted = report.rows_upserted,
                    "Periodic sync finished."
                ),
                Err(e) => tracing::error!(error = ?e, "Periodic sync failed."),
            }
        }
    }))
}
