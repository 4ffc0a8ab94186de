use serde::Deserialize;

/// Deployment-level booking rules. These are configuration, not per-seat
/// data; the engine takes one copy at construction.
#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// How long a hold keeps a seat off the market before it expires.
    #[serde(default = "default_hold_window")]
    pub hold_window_seconds: u64,
    /// Attempts per compensating action (orphan release, refund).
    #[serde(default = "default_compensation_attempts")]
    pub compensation_max_attempts: u32,
    /// Base delay between compensation attempts; doubles per retry.
    #[serde(default = "default_compensation_backoff")]
    pub compensation_backoff_ms: u64,
    /// Ceiling on one payment-provider call before it counts as failed.
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_ms: u64,
}

fn default_hold_window() -> u64 { 300 }
fn default_compensation_attempts() -> u32 { 3 }
fn default_compensation_backoff() -> u64 { 50 }
fn default_gateway_timeout() -> u64 { 5_000 }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            hold_window_seconds: default_hold_window(),
            compensation_max_attempts: default_compensation_attempts(),
            compensation_backoff_ms: default_compensation_backoff(),
            gateway_timeout_ms: default_gateway_timeout(),
        }
    }
}

impl BookingRules {
    pub fn hold_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.hold_window_seconds as i64)
    }

    /// Reject configurations the lifecycle cannot run on. A zero hold
    /// window would mint reservations that are expired at creation.
    pub fn validate(&self) -> Result<(), String> {
        if self.hold_window_seconds == 0 {
            return Err("booking_rules.hold_window_seconds must be at least 1".to_string());
        }
        if self.compensation_max_attempts == 0 {
            return Err("booking_rules.compensation_max_attempts must be at least 1".to_string());
        }
        if self.gateway_timeout_ms == 0 {
            return Err("booking_rules.gateway_timeout_ms must be at least 1".to_string());
        }
        Ok(())
    }
}
