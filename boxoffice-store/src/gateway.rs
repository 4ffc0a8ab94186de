use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use boxoffice_core::payment::{ChargeError, PaymentGateway, PaymentMethod, RefundError};

#[derive(Debug, Clone)]
struct ChargeRecord {
    user_id: Uuid,
    amount: i64,
    refunded: bool,
}

#[derive(Default)]
struct GatewayState {
    wallets: HashMap<Uuid, i64>,
    charges: HashMap<String, ChargeRecord>,
}

/// In-memory wallet gateway. Charges deduct from per-user balances and
/// refunds credit them back; `fail_next_charge`, `delay_next_charge` and
/// `set_outage` script the failure paths for tests.
#[derive(Default)]
pub struct MockPaymentGateway {
    state: Mutex<GatewayState>,
    fail_next_charge: AtomicBool,
    charge_delay_ms: AtomicU64,
    outage: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open_wallet(&self, user_id: Uuid, balance: i64) {
        self.state.lock().await.wallets.insert(user_id, balance);
    }

    pub async fn balance_of(&self, user_id: Uuid) -> i64 {
        self.state
            .lock()
            .await
            .wallets
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }

    /// Decline the next charge, whatever the balance says.
    pub fn fail_next_charge(&self) {
        self.fail_next_charge.store(true, Ordering::SeqCst);
    }

    /// Stall the next charge for `delay`, simulating a provider that
    /// accepts the request and then stops answering.
    pub fn delay_next_charge(&self, delay: Duration) {
        self.charge_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Take the provider offline for every call until switched back.
    pub fn set_outage(&self, on: bool) {
        self.outage.store(on, Ordering::SeqCst);
    }

    pub async fn charge_count(&self) -> usize {
        self.state.lock().await.charges.len()
    }

    pub async fn refunded_count(&self) -> usize {
        self.state
            .lock()
            .await
            .charges
            .values()
            .filter(|c| c.refunded)
            .count()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn balance(&self, user_id: Uuid) -> Result<i64, ChargeError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(ChargeError::Unavailable("provider offline".to_string()));
        }
        self.state
            .lock()
            .await
            .wallets
            .get(&user_id)
            .copied()
            .ok_or(ChargeError::UnknownAccount(user_id))
    }

    async fn charge(
        &self,
        user_id: Uuid,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<String, ChargeError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(ChargeError::Unavailable("provider offline".to_string()));
        }
        // The stall sits before any funds move, so a caller that gives up
        // on the call leaves the wallet untouched.
        let stall_ms = self.charge_delay_ms.swap(0, Ordering::SeqCst);
        if stall_ms > 0 {
            tokio::time::sleep(Duration::from_millis(stall_ms)).await;
        }
        if self.fail_next_charge.swap(false, Ordering::SeqCst) {
            return Err(ChargeError::Declined("scripted decline".to_string()));
        }
        if amount <= 0 {
            return Err(ChargeError::Declined(format!(
                "non-positive amount {}",
                amount
            )));
        }

        let mut state = self.state.lock().await;
        let balance = state
            .wallets
            .get_mut(&user_id)
            .ok_or(ChargeError::UnknownAccount(user_id))?;
        if *balance < amount {
            return Err(ChargeError::InsufficientFunds {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;

        let transaction_id = format!("txn_{}", Uuid::new_v4().simple());
        state.charges.insert(
            transaction_id.clone(),
            ChargeRecord {
                user_id,
                amount,
                refunded: false,
            },
        );
        tracing::debug!(
            %user_id,
            amount,
            method = method.as_str(),
            transaction_id,
            "charge accepted"
        );
        Ok(transaction_id)
    }

    async fn refund(&self, transaction_id: &str, reason: &str) -> Result<(), RefundError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(RefundError::Unavailable("provider offline".to_string()));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let charge = state
            .charges
            .get_mut(transaction_id)
            .ok_or_else(|| RefundError::UnknownTransaction(transaction_id.to_string()))?;
        if charge.refunded {
            return Err(RefundError::AlreadyRefunded(transaction_id.to_string()));
        }
        charge.refunded = true;
        let (user_id, amount) = (charge.user_id, charge.amount);
        *state.wallets.entry(user_id).or_insert(0) += amount;
        tracing::debug!(%user_id, amount, transaction_id, reason, "charge refunded");
        Ok(())
    }
}
