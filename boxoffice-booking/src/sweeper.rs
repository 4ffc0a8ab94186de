use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::engine::BookingEngine;

/// Periodic expiry sweep plus reconciliation. Runs until the owning task
/// is aborted; a failing cycle is logged and the loop keeps going.
pub async fn run_sweeper(engine: Arc<BookingEngine>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "expiry sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // interval fires immediately on the first tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match engine.sweep_expired_reservations().await {
            Ok(report) if report.swept > 0 || report.failed > 0 => {
                info!(
                    swept = report.swept,
                    skipped = report.skipped,
                    failed = report.failed,
                    "sweep cycle finished"
                );
            }
            Ok(_) => {}
            Err(err) => error!(error = %err, "sweep cycle failed"),
        }

        match engine.reconcile().await {
            Ok(report)
                if report.seats_confirmed > 0 || report.seats_released > 0 || report.failed > 0 =>
            {
                info!(
                    seats_confirmed = report.seats_confirmed,
                    seats_released = report.seats_released,
                    failed = report.failed,
                    "reconcile cycle finished"
                );
            }
            Ok(_) => {}
            Err(err) => error!(error = %err, "reconcile cycle failed"),
        }
    }
}
