use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use wayfare_booking::BookingManager;

/// Recurring sweep that force-cancels unpaid bookings past the payment
/// window. One task per process, independent of request traffic; per-booking
/// failures are handled inside the sweep and never stop the loop.
pub async fn run_expiration_worker(manager: Arc<BookingManager>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "expiration worker started");

    loop {
        ticker.tick().await;
        let report = manager.cancel_expired(Utc::now()).await;
        if !report.cancelled.is_empty() || report.failed > 0 {
            info!(
                cancelled = report.cancelled.len(),
                failed = report.failed,
                "expiration sweep finished"
            );
        }
    }
}
