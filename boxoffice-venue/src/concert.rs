use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seat::Seat;

/// A single performance customers can book seats for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concert {
    pub id: Uuid,
    pub title: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Concert {
    pub fn new(title: &str, venue: &str, starts_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            venue: venue.to_string(),
            starts_at,
            created_at: now,
        }
    }
}

/// Seeds the seat inventory for one concert. Seats come into existence
/// Available at setup time and live for the concert's lifetime.
#[derive(Debug, Clone)]
pub struct SeatMap {
    pub concert_id: Uuid,
    pub seat_count: u32,
    pub price: i64,
    pub currency: String,
}

impl SeatMap {
    pub fn new(concert_id: Uuid, seat_count: u32, price: i64, currency: &str) -> Self {
        Self {
            concert_id,
            seat_count,
            price,
            currency: currency.to_string(),
        }
    }

    /// Materialize the seats, numbered from 1.
    pub fn build(&self, now: DateTime<Utc>) -> Vec<Seat> {
        (1..=self.seat_count)
            .map(|number| Seat::new(self.concert_id, number, self.price, &self.currency, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_map_builds_numbered_available_seats() {
        let concert_id = Uuid::new_v4();
        let map = SeatMap::new(concert_id, 5, 120_000, "KRW");

        let seats = map.build(Utc::now());

        assert_eq!(seats.len(), 5);
        for (idx, seat) in seats.iter().enumerate() {
            assert_eq!(seat.seat_number, idx as u32 + 1);
            assert_eq!(seat.concert_id, concert_id);
            assert_eq!(seat.price, 120_000);
            assert!(seat.is_available());
        }
    }
}
