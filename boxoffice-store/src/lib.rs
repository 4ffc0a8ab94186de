pub mod app_config;
pub mod gateway;
pub mod memory;

pub use app_config::Config;
pub use gateway::MockPaymentGateway;
pub use memory::{InMemoryPaymentLedger, InMemoryReservationLedger, InMemorySeatStore};
