use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boxoffice_core::payment::PaymentMethod;
use boxoffice_venue::seat::Seat;

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Held,
    Confirmed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Expired)
    }
}

/// Payment attempt status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

/// A user's claim on one seat, from hold to settlement.
///
/// Price and currency are snapshotted from the seat at hold time; later
/// changes to the seat's advertised price never affect what an existing
/// reservation settles for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub concert_id: Uuid,
    pub seat_id: Uuid,
    pub seat_number: u32,
    pub price: i64,
    pub currency: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Open a Held reservation on a seat the caller has just claimed.
    /// The id is minted by the caller because the seat records it as
    /// holder before this row exists.
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        seat: &Seat,
        now: DateTime<Utc>,
        hold_window: Duration,
    ) -> Self {
        Self {
            id,
            user_id,
            concert_id: seat.concert_id,
            seat_id: seat.id,
            seat_number: seat.seat_number,
            price: seat.price,
            currency: seat.currency.clone(),
            status: ReservationStatus::Held,
            created_at: now,
            expires_at: now + hold_window,
            confirmed_at: None,
            cancelled_at: None,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Transition: Held → Confirmed (payment settled)
    ///
    /// Re-checks the hold window and the payment against this reservation,
    /// because a charge can settle after the guard that admitted it.
    pub fn confirm(&mut self, payment: &Payment, now: DateTime<Utc>) -> Result<(), ReservationError> {
        if self.status != ReservationStatus::Held {
            return Err(ReservationError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: ReservationStatus::Confirmed,
            });
        }
        if self.is_expired(now) {
            return Err(ReservationError::HoldExpired {
                id: self.id,
                expires_at: self.expires_at,
            });
        }
        if payment.reservation_id != self.id || payment.status != PaymentStatus::Success {
            return Err(ReservationError::PaymentNotSettled { id: self.id });
        }
        if payment.amount != self.price {
            return Err(ReservationError::AmountMismatch {
                amount: payment.amount,
                price: self.price,
            });
        }
        self.status = ReservationStatus::Confirmed;
        self.confirmed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Transition: Held/Confirmed → Cancelled (user initiated)
    pub fn cancel(&mut self, requester: Uuid, now: DateTime<Utc>) -> Result<(), ReservationError> {
        if requester != self.user_id {
            return Err(ReservationError::NotOwner {
                id: self.id,
                requester,
            });
        }
        match self.status {
            ReservationStatus::Held | ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Cancelled;
                self.cancelled_at = Some(now);
                self.updated_at = now;
                Ok(())
            }
            from => Err(ReservationError::InvalidTransition {
                id: self.id,
                from,
                to: ReservationStatus::Cancelled,
            }),
        }
    }

    /// Transition: Held → Expired (system initiated)
    ///
    /// Idempotent against races with cancellation and payment: a
    /// reservation that already left Held reports `Ok(false)` rather than
    /// an error, since the sweep and user actions legitimately overlap.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<bool, ReservationError> {
        match self.status {
            ReservationStatus::Held => {
                if !self.is_expired(now) {
                    return Err(ReservationError::NotYetExpired {
                        id: self.id,
                        expires_at: self.expires_at,
                    });
                }
                self.status = ReservationStatus::Expired;
                self.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("invalid transition for reservation {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    },
    #[error("reservation {id} hold window elapsed at {expires_at}")]
    HoldExpired {
        id: Uuid,
        expires_at: DateTime<Utc>,
    },
    #[error("reservation {id} is not due to expire before {expires_at}")]
    NotYetExpired {
        id: Uuid,
        expires_at: DateTime<Utc>,
    },
    #[error("reservation {id} does not belong to user {requester}")]
    NotOwner { id: Uuid, requester: Uuid },
    #[error("reservation {id} has no settled payment to confirm against")]
    PaymentNotSettled { id: Uuid },
    #[error("payment amount {amount} does not match reserved price {price}")]
    AmountMismatch { amount: i64, price: i64 },
}

/// One charge attempt against a reservation.
///
/// Attempts are append-only: a retry after a failed charge is a new row,
/// never a reset of an old one, so the ledger keeps the full audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Provider transaction id, set exactly once on completion.
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Open a Pending attempt; the amount is the reservation's snapshot
    /// price, never the seat's current advertised price.
    pub fn new(reservation: &Reservation, method: PaymentMethod, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id: reservation.id,
            user_id: reservation.user_id,
            amount: reservation.price,
            currency: reservation.currency.clone(),
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            failure_reason: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition: Pending → Success (provider accepted the charge)
    pub fn complete(&mut self, transaction_id: String, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: PaymentStatus::Success,
            });
        }
        self.status = PaymentStatus::Success;
        self.transaction_id = Some(transaction_id);
        self.updated_at = now;
        Ok(())
    }

    /// Transition: Pending → Failed (charge declined or attempt voided)
    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: PaymentStatus::Failed,
            });
        }
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Transition: Success → Cancelled (charge refunded)
    pub fn refund(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Success {
            return Err(PaymentError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: PaymentStatus::Cancelled,
            });
        }
        self.status = PaymentStatus::Cancelled;
        self.refund_reason = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Pending and Success rows still tie up money or may do so.
    pub fn is_open(&self) -> bool {
        matches!(self.status, PaymentStatus::Pending | PaymentStatus::Success)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid transition for payment {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    },
}
