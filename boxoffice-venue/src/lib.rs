pub mod concert;
pub mod repository;
pub mod seat;

pub use concert::{Concert, SeatMap};
pub use repository::SeatStore;
pub use seat::{Seat, SeatError, SeatStatus};
