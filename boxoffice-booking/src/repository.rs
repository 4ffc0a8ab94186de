use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Payment, PaymentStatus, Reservation, ReservationStatus};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("duplicate record: {0}")]
    Duplicate(Uuid),
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

/// Reservation records keyed by id. Rows are never deleted; cancelled and
/// expired reservations stay behind as audit history.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn insert(&self, reservation: &Reservation) -> Result<(), LedgerError>;

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, LedgerError>;

    /// Compare-and-save: persist `updated` only while the stored row still
    /// carries `expected` status, and report whether it landed. This is
    /// how racing transitions (user cancel vs expiry sweep vs payment
    /// confirmation) get exactly one winner.
    async fn save_if_status(
        &self,
        updated: &Reservation,
        expected: ReservationStatus,
    ) -> Result<bool, LedgerError>;

    /// Held reservations whose hold window elapsed at or before `before`
    async fn find_expired_held(&self, before: DateTime<Utc>) -> Result<Vec<Reservation>, LedgerError>;

    async fn find_by_status(&self, status: ReservationStatus) -> Result<Vec<Reservation>, LedgerError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, LedgerError>;
}

/// Payment attempts keyed by id. A reservation may own several rows, one
/// per attempt, but at most one of them is ever non-Failed at a time.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError>;

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, LedgerError>;

    /// Compare-and-save with the same contract as the reservation ledger;
    /// settles races between a completing charge and a sweep voiding it.
    async fn save_if_status(
        &self,
        updated: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, LedgerError>;

    async fn find_by_reservation(&self, reservation_id: Uuid) -> Result<Vec<Payment>, LedgerError>;
}
