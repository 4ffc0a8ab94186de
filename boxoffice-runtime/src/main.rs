use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boxoffice_booking::engine::BookingEngine;
use boxoffice_booking::sweeper::run_sweeper;
use boxoffice_core::clock::SystemClock;
use boxoffice_core::notifier::BroadcastNotifier;
use boxoffice_store::app_config::Config;
use boxoffice_store::gateway::MockPaymentGateway;
use boxoffice_store::memory::{InMemoryPaymentLedger, InMemoryReservationLedger, InMemorySeatStore};
use boxoffice_venue::concert::{Concert, SeatMap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice_booking=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        hold_window_seconds = config.booking_rules.hold_window_seconds,
        sweep_interval_seconds = config.sweeper.interval_seconds,
        "starting boxoffice runtime"
    );

    let seats = Arc::new(InMemorySeatStore::new());
    let reservations = Arc::new(InMemoryReservationLedger::new());
    let payments = Arc::new(InMemoryPaymentLedger::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let notifier = Arc::new(BroadcastNotifier::new(config.runtime.event_channel_capacity));
    let clock = Arc::new(SystemClock);

    // Seed the demo venue so the engine has inventory from the start.
    let now = chrono::Utc::now();
    let concert = Concert::new(
        &config.demo.concert_title,
        &config.demo.venue,
        now + chrono::Duration::days(30),
        now,
    );
    let seat_map = SeatMap::new(
        concert.id,
        config.demo.seat_count,
        config.demo.seat_price,
        &config.demo.currency,
    );
    seats.seed(seat_map.build(now)).await;
    tracing::info!(
        concert_id = %concert.id,
        title = %concert.title,
        seats = config.demo.seat_count,
        "demo concert seeded"
    );

    let engine = Arc::new(BookingEngine::new(
        seats,
        reservations,
        payments,
        gateway,
        clock,
        notifier.clone(),
        config.booking_rules.clone(),
    ));

    // Lifecycle event log; a front-end would subscribe the same way.
    let mut events = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    event = event.name(),
                    reservation_id = %event.reservation_id(),
                    "lifecycle event"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event log fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let sweeper = tokio::spawn(run_sweeper(
        engine,
        Duration::from_secs(config.sweeper.interval_seconds),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    sweeper.abort();

    Ok(())
}
