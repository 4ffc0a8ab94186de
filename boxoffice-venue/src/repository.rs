use async_trait::async_trait;
use uuid::Uuid;

use crate::seat::{Seat, SeatError};

/// Seat persistence port, the single source of truth for seat occupancy.
///
/// `hold` is the serialization point that prevents double booking: the
/// availability check and the transition to Held must be one atomic
/// operation with respect to concurrent callers on the same seat id, never
/// a read followed by a separate write.
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Atomically claim an Available seat for `holder`; returns the seat
    /// as held so callers can snapshot its price
    async fn hold(&self, seat_id: Uuid, holder: Uuid) -> Result<Seat, SeatError>;

    /// Finalize a held seat, only for the holder that won the hold
    async fn confirm(&self, seat_id: Uuid, holder: Uuid) -> Result<(), SeatError>;

    /// Return a seat to Available; succeeds without effect when the seat
    /// is already Available
    async fn release(&self, seat_id: Uuid, holder: Uuid) -> Result<(), SeatError>;

    async fn get(&self, seat_id: Uuid) -> Result<Option<Seat>, SeatError>;
}
