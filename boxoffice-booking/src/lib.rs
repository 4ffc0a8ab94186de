pub mod engine;
pub mod models;
pub mod policy;
pub mod repository;
pub mod sweeper;

pub use engine::{BookingEngine, BookingError, ReconcileReport, SweepReport};
pub use models::{
    Payment, PaymentError, PaymentStatus, Reservation, ReservationError, ReservationStatus,
};
pub use policy::BookingRules;
pub use repository::{LedgerError, PaymentLedger, ReservationLedger};
