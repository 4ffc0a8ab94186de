pub mod clock;
pub mod notifier;
pub mod payment;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{
    BroadcastNotifier, EventNotifier, NotifyError, RecordingNotifier, ReservationEvent,
};
pub use payment::{ChargeError, PaymentGateway, PaymentMethod, RefundError};
