use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use boxoffice_booking::models::{Payment, PaymentStatus, Reservation, ReservationStatus};
use boxoffice_booking::repository::{LedgerError, PaymentLedger, ReservationLedger};
use boxoffice_venue::repository::SeatStore;
use boxoffice_venue::seat::{Seat, SeatError};

/// Seat records behind a single async lock.
///
/// Every mutation runs its check and its write inside one lock guard,
/// which is what makes `hold` the atomic claim the engine relies on. Rows
/// are timestamped with wall time the way a database would stamp them.
#[derive(Default)]
pub struct InMemorySeatStore {
    seats: Mutex<HashMap<Uuid, Seat>>,
}

impl InMemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setup-time seeding; concert provisioning is not part of the
    /// engine's runtime contract.
    pub async fn seed(&self, seats: Vec<Seat>) {
        let mut guard = self.seats.lock().await;
        for seat in seats {
            guard.insert(seat.id, seat);
        }
    }

    pub async fn snapshot(&self, seat_id: Uuid) -> Option<Seat> {
        self.seats.lock().await.get(&seat_id).cloned()
    }

    pub async fn seats_for_concert(&self, concert_id: Uuid) -> Vec<Seat> {
        self.seats
            .lock()
            .await
            .values()
            .filter(|seat| seat.concert_id == concert_id)
            .cloned()
            .collect()
    }

    /// Overwrite a seat's advertised price, leaving its status alone.
    /// Existing reservations keep settling at their snapshot price.
    pub async fn reprice(&self, seat_id: Uuid, price: i64) -> bool {
        match self.seats.lock().await.get_mut(&seat_id) {
            Some(seat) => {
                seat.price = price;
                seat.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SeatStore for InMemorySeatStore {
    async fn hold(&self, seat_id: Uuid, holder: Uuid) -> Result<Seat, SeatError> {
        let mut seats = self.seats.lock().await;
        let seat = seats.get_mut(&seat_id).ok_or(SeatError::NotFound(seat_id))?;
        seat.hold(holder, Utc::now())?;
        Ok(seat.clone())
    }

    async fn confirm(&self, seat_id: Uuid, holder: Uuid) -> Result<(), SeatError> {
        let mut seats = self.seats.lock().await;
        let seat = seats.get_mut(&seat_id).ok_or(SeatError::NotFound(seat_id))?;
        seat.confirm(holder, Utc::now())
    }

    async fn release(&self, seat_id: Uuid, holder: Uuid) -> Result<(), SeatError> {
        let mut seats = self.seats.lock().await;
        let seat = seats.get_mut(&seat_id).ok_or(SeatError::NotFound(seat_id))?;
        seat.release(holder, Utc::now()).map(|_| ())
    }

    async fn get(&self, seat_id: Uuid) -> Result<Option<Seat>, SeatError> {
        Ok(self.seats.lock().await.get(&seat_id).cloned())
    }
}

/// Reservation rows in a map, with the compare-and-save applied under one
/// lock guard to mirror an `UPDATE .. WHERE status = ?` statement.
#[derive(Default)]
pub struct InMemoryReservationLedger {
    rows: Mutex<HashMap<Uuid, Reservation>>,
    fail_next_insert: AtomicBool,
}

impl InMemoryReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot insert failure, for exercising compensation paths.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReservationLedger for InMemoryReservationLedger {
    async fn insert(&self, reservation: &Reservation) -> Result<(), LedgerError> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Backend("injected insert failure".to_string()));
        }
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&reservation.id) {
            return Err(LedgerError::Duplicate(reservation.id));
        }
        rows.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, LedgerError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn save_if_status(
        &self,
        updated: &Reservation,
        expected: ReservationStatus,
    ) -> Result<bool, LedgerError> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&updated.id) {
            Some(row) if row.status == expected => {
                *row = updated.clone();
                Ok(true)
            }
            Some(_) | None => Ok(false),
        }
    }

    async fn find_expired_held(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, LedgerError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|r| r.status == ReservationStatus::Held && r.expires_at <= before)
            .cloned()
            .collect())
    }

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, LedgerError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, LedgerError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Payment rows in a map, same compare-and-save contract as the
/// reservation ledger.
#[derive(Default)]
pub struct InMemoryPaymentLedger {
    rows: Mutex<HashMap<Uuid, Payment>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&payment.id) {
            return Err(LedgerError::Duplicate(payment.id));
        }
        rows.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, LedgerError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn save_if_status(
        &self,
        updated: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, LedgerError> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&updated.id) {
            Some(row) if row.status == expected => {
                *row = updated.clone();
                Ok(true)
            }
            Some(_) | None => Ok(false),
        }
    }

    async fn find_by_reservation(&self, reservation_id: Uuid) -> Result<Vec<Payment>, LedgerError> {
        let mut rows: Vec<Payment> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|p| p.reservation_id == reservation_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.created_at);
        Ok(rows)
    }
}
