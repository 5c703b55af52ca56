use chrono::{DateTime, Duration, Timelike, Utc};
use log::*;
use partner_billing_engine::{events::EventProducers, BillingApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the daily billing worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker sleeps until the configured UTC hour, runs one billing cycle, and goes back to sleep. A failed run is
/// logged and retried naturally at the next day's firing; per-partner failures inside a run are reported in the run
/// summary without aborting the rest of the scan.
pub fn start_billing_worker(db: SqliteDatabase, producers: EventProducers, hour_utc: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = BillingApi::new(db, producers);
        info!("🕰️ Daily billing worker started. Cycles fire at {hour_utc:02}:00 UTC");
        loop {
            let pause = duration_until_next_run(Utc::now(), hour_utc);
            debug!("🕰️ Next billing cycle in {} s", pause.as_secs());
            tokio::time::sleep(pause).await;
            info!("🕰️ Running scheduled billing cycle");
            match api.run_billing_cycle(Utc::now()).await {
                Ok(summary) => {
                    info!(
                        "🕰️ Billing cycle complete. {} partners invoiced, {} skipped.",
                        summary.invoiced_count(),
                        summary.skipped
                    );
                    for failure in &summary.failures {
                        error!("🕰️ Billing failed for partner {}: {}", failure.partner_id, failure.reason);
                    }
                },
                Err(e) => {
                    error!("🕰️ Billing cycle aborted: {e}");
                },
            }
        }
    })
}

/// Time until the next occurrence of `hour_utc:00`. A run scheduled for earlier today has already fired (or was
/// missed), so it lands on tomorrow's slot.
fn duration_until_next_run(now: DateTime<Utc>, hour_utc: u32) -> std::time::Duration {
    let next = now
        .with_hour(hour_utc)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .map(|t| if t > now { t } else { t + Duration::days(1) });
    match next {
        Some(next) => (next - now).to_std().unwrap_or(std::time::Duration::from_secs(60)),
        None => {
            // Only reachable with an invalid hour, which the config layer already rejects
            warn!("🕰️ Could not compute the next billing run time for hour {hour_utc}. Retrying in an hour.");
            std::time::Duration::from_secs(3600)
        },
    }
}
