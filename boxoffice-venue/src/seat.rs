use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Confirmed,
}

/// One sellable seat of a concert.
///
/// `holder` is the id of the reservation currently occupying the seat and
/// is `Some` exactly when the status is Held or Confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub concert_id: Uuid,
    pub seat_number: u32,
    /// Advertised price in minor currency units.
    pub price: i64,
    pub currency: String,
    pub status: SeatStatus,
    pub holder: Option<Uuid>,
    pub held_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    pub fn new(
        concert_id: Uuid,
        seat_number: u32,
        price: i64,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            concert_id,
            seat_number,
            price,
            currency: currency.to_string(),
            status: SeatStatus::Available,
            holder: None,
            held_at: None,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    /// Available -> Held. Stores must apply this under their own
    /// serialization so concurrent claims on one seat see a single winner.
    pub fn hold(&mut self, holder: Uuid, now: DateTime<Utc>) -> Result<(), SeatError> {
        if self.status != SeatStatus::Available {
            return Err(SeatError::Unavailable(self.id));
        }
        self.status = SeatStatus::Held;
        self.holder = Some(holder);
        self.held_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Held -> Confirmed, only for the reservation that won the hold.
    pub fn confirm(&mut self, holder: Uuid, now: DateTime<Utc>) -> Result<(), SeatError> {
        if self.status != SeatStatus::Held || self.holder != Some(holder) {
            return Err(SeatError::InvalidState {
                seat_id: self.id,
                status: self.status,
            });
        }
        self.status = SeatStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    /// Held/Confirmed -> Available for a matching holder. Releasing an
    /// already available seat reports `Ok(false)` so compensating callers
    /// can retry safely after partial failures.
    pub fn release(&mut self, holder: Uuid, now: DateTime<Utc>) -> Result<bool, SeatError> {
        if self.status == SeatStatus::Available {
            return Ok(false);
        }
        if self.holder != Some(holder) {
            return Err(SeatError::UnauthorizedRelease {
                seat_id: self.id,
                holder,
            });
        }
        self.status = SeatStatus::Available;
        self.holder = None;
        self.held_at = None;
        self.updated_at = now;
        Ok(true)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("seat not found: {0}")]
    NotFound(Uuid),
    #[error("seat unavailable: {0}")]
    Unavailable(Uuid),
    #[error("invalid state for seat {seat_id}: {status:?}")]
    InvalidState { seat_id: Uuid, status: SeatStatus },
    #[error("release of seat {seat_id} not authorized for {holder}")]
    UnauthorizedRelease { seat_id: Uuid, holder: Uuid },
    #[error("seat store backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat() -> Seat {
        Seat::new(Uuid::new_v4(), 7, 150_000, "KRW", Utc::now())
    }

    #[test]
    fn test_hold_takes_available_seat() {
        let mut seat = seat();
        let holder = Uuid::new_v4();

        seat.hold(holder, Utc::now()).unwrap();

        assert_eq!(seat.status, SeatStatus::Held);
        assert_eq!(seat.holder, Some(holder));
        assert!(seat.held_at.is_some());
    }

    #[test]
    fn test_hold_rejects_taken_seat() {
        let mut seat = seat();
        seat.hold(Uuid::new_v4(), Utc::now()).unwrap();

        let second = seat.hold(Uuid::new_v4(), Utc::now());
        assert!(matches!(second, Err(SeatError::Unavailable(_))));
        assert_eq!(seat.status, SeatStatus::Held);
    }

    #[test]
    fn test_confirm_requires_matching_holder() {
        let mut seat = seat();
        let holder = Uuid::new_v4();
        seat.hold(holder, Utc::now()).unwrap();

        let wrong = seat.confirm(Uuid::new_v4(), Utc::now());
        assert!(matches!(wrong, Err(SeatError::InvalidState { .. })));

        seat.confirm(holder, Utc::now()).unwrap();
        assert_eq!(seat.status, SeatStatus::Confirmed);
    }

    #[test]
    fn test_confirm_rejects_available_seat() {
        let mut seat = seat();
        let result = seat.confirm(Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(SeatError::InvalidState { .. })));
    }

    #[test]
    fn test_release_returns_seat_to_pool() {
        let mut seat = seat();
        let holder = Uuid::new_v4();
        seat.hold(holder, Utc::now()).unwrap();

        assert!(seat.release(holder, Utc::now()).unwrap());
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(seat.holder, None);
        assert_eq!(seat.held_at, None);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut seat = seat();
        let holder = Uuid::new_v4();
        seat.hold(holder, Utc::now()).unwrap();

        assert!(seat.release(holder, Utc::now()).unwrap());
        // second release is a no-op, not an error
        assert!(!seat.release(holder, Utc::now()).unwrap());
    }

    #[test]
    fn test_release_rejects_foreign_holder() {
        let mut seat = seat();
        seat.hold(Uuid::new_v4(), Utc::now()).unwrap();

        let result = seat.release(Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(SeatError::UnauthorizedRelease { .. })));
        assert_eq!(seat.status, SeatStatus::Held);
    }

    #[test]
    fn test_release_confirmed_seat_for_refund_path() {
        let mut seat = seat();
        let holder = Uuid::new_v4();
        seat.hold(holder, Utc::now()).unwrap();
        seat.confirm(holder, Utc::now()).unwrap();

        assert!(seat.release(holder, Utc::now()).unwrap());
        assert_eq!(seat.status, SeatStatus::Available);
    }
}
