//! In-process trigger for the reminder batch.
//!
//! Only used when no external scheduler calls the cron endpoint. The first
//! run is aligned to the next wall-clock multiple of the interval so that
//! several replicas started at different times still tick together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use slotwise_engine::ReminderBatchJob;

/// Seconds until the next multiple of `interval_secs` since the epoch.
pub fn get_start_delay(now_secs: u64, interval_secs: u64) -> u64 {
    if interval_secs == 0 {
        return 0;
    }
    interval_secs - now_secs % interval_secs
}

pub fn start_reminder_clock(job: Arc<ReminderBatchJob>, interval_secs: u64) -> JoinHandle<()> {
    let interval_secs = interval_secs.max(1);

    tokio::spawn(async move {
        let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
        let delay = get_start_delay(now_secs, interval_secs);
        tracing::info!(interval_secs, first_run_in_secs = delay, "Reminder scheduler started");

        let start = Instant::now() + Duration::from_secs(delay);
        let mut ticker = interval_at(start, Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match job.run().await {
                Ok(result) => {
                    tracing::debug!(sent = result.sent, failed = result.failed, "Scheduled reminder run finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled reminder run failed");
                }
            }
        }
    })
}
