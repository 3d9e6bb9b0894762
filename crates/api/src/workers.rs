//! Background maintenance tasks.
//!
//! The only worker so far rotates the error log into gzip archives on a
//! fixed interval, keeping the live NDJSON file bounded.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::ErrorLog;

/// Spawn the periodic error-log rotation task.
///
/// Runs until the process exits; a failed rotation is reported and retried
/// at the next tick.
pub fn spawn_log_rotation(errors: ErrorLog, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; rotation waits a full period.
        interval.tick().await;

        loop {
            interval.tick().await;
            match errors.rotate().await {
                Ok(Some(archive)) => {
                    tracing::info!(archive = %archive.display(), "error log rotated");
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "error log rotation failed");
                }
            }
        }
    })
}
