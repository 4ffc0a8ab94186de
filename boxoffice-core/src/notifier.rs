use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Emitted after each successful lifecycle transition, never before the
/// transition has landed in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationEvent {
    ReservationCreated {
        reservation_id: Uuid,
        user_id: Uuid,
        concert_id: Uuid,
        seat_id: Uuid,
        price: i64,
        expires_at: DateTime<Utc>,
    },
    ReservationConfirmed {
        reservation_id: Uuid,
        seat_id: Uuid,
        payment_id: Uuid,
        amount: i64,
        confirmed_at: DateTime<Utc>,
    },
    ReservationCancelled {
        reservation_id: Uuid,
        seat_id: Uuid,
        refunded: bool,
        cancelled_at: DateTime<Utc>,
    },
    ReservationExpired {
        reservation_id: Uuid,
        seat_id: Uuid,
        expired_at: DateTime<Utc>,
    },
}

impl ReservationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ReservationEvent::ReservationCreated { .. } => "RESERVATION_CREATED",
            ReservationEvent::ReservationConfirmed { .. } => "RESERVATION_CONFIRMED",
            ReservationEvent::ReservationCancelled { .. } => "RESERVATION_CANCELLED",
            ReservationEvent::ReservationExpired { .. } => "RESERVATION_EXPIRED",
        }
    }

    pub fn reservation_id(&self) -> Uuid {
        match self {
            ReservationEvent::ReservationCreated { reservation_id, .. }
            | ReservationEvent::ReservationConfirmed { reservation_id, .. }
            | ReservationEvent::ReservationCancelled { reservation_id, .. }
            | ReservationEvent::ReservationExpired { reservation_id, .. } => *reservation_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier channel closed")]
    Closed,
    #[error("notifier backend failure: {0}")]
    Backend(String),
}

/// Best-effort event sink. Delivery never gates whether a transition
/// succeeded; callers log failures and move on.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, event: &ReservationEvent) -> Result<(), NotifyError>;
}

/// Fan-out over a tokio broadcast channel. Front-ends subscribe to push
/// live seat-state updates to waiting customers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ReservationEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventNotifier for BroadcastNotifier {
    async fn publish(&self, event: &ReservationEvent) -> Result<(), NotifyError> {
        // send only errors when nobody is subscribed, which is fine for a
        // fire-and-forget channel
        match self.tx.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!(event = event.name(), receivers, "event published");
            }
            Err(_) => {
                tracing::debug!(event = event.name(), "no subscribers for event");
            }
        }
        Ok(())
    }
}

/// Captures published events in order. Test fixture.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ReservationEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ReservationEvent> {
        self.events.lock().await.clone()
    }

    pub async fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().await.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn publish(&self, event: &ReservationEvent) -> Result<(), NotifyError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
