use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_app::{app_config::Config, worker};
use wayfare_booking::{BookingManager, LogEmailSink, LogNotificationSink, MockQrIssuer};
use wayfare_catalog::{CapacityLedger, TourDirectory};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!(
        payment_timeout_minutes = config.booking_rules.payment_timeout_minutes,
        sweep_interval_seconds = config.booking_rules.sweep_interval_seconds,
        "Starting Wayfare booking engine"
    );

    let tours = Arc::new(TourDirectory::new());
    let ledger = Arc::new(CapacityLedger::new());

    let manager = Arc::new(BookingManager::new(
        tours,
        ledger,
        Arc::new(MockQrIssuer::default()),
        Arc::new(LogNotificationSink),
        Arc::new(LogEmailSink),
        config.booking_rules.payment_timeout(),
    ));

    tokio::spawn(worker::run_expiration_worker(
        Arc::clone(&manager),
        config.booking_rules.sweep_period(),
    ));

    tracing::info!("Expiration worker scheduled; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutting down");
}
