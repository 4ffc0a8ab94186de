use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};
use uuid::Uuid;

use boxoffice_core::clock::Clock;
use boxoffice_core::notifier::{EventNotifier, ReservationEvent};
use boxoffice_core::payment::{ChargeError, PaymentGateway, PaymentMethod, RefundError};
use boxoffice_venue::repository::SeatStore;
use boxoffice_venue::seat::{SeatError, SeatStatus};

use crate::models::{Payment, PaymentStatus, Reservation, ReservationError, ReservationStatus};
use crate::policy::BookingRules;
use crate::repository::{LedgerError, PaymentLedger, ReservationLedger};

/// User-visible failures of the booking operations, each with a stable
/// code front-ends can switch on.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("seat not found: {0}")]
    SeatNotFound(Uuid),
    #[error("seat already reserved: {0}")]
    SeatAlreadyReserved(Uuid),
    #[error("reservation not found: {0}")]
    ReservationNotFound(Uuid),
    #[error("invalid reservation state: {0}")]
    InvalidReservationState(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },
    #[error("payment processing failed: {0}")]
    PaymentProcessingFailed(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "VALIDATION_FAILED",
            BookingError::SeatNotFound(_) => "SEAT_NOT_FOUND",
            BookingError::SeatAlreadyReserved(_) => "SEAT_ALREADY_RESERVED",
            BookingError::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            BookingError::InvalidReservationState(_) => "INVALID_RESERVATION_STATE",
            BookingError::Unauthorized(_) => "UNAUTHORIZED",
            BookingError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            BookingError::PaymentProcessingFailed(_) => "PAYMENT_PROCESSING_FAILED",
            BookingError::Storage(_) => "STORAGE_FAILURE",
            BookingError::Inconsistent(_) => "INCONSISTENT_STATE",
        }
    }
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        BookingError::Storage(err.to_string())
    }
}

/// Outcome counters for one expiry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Reservations moved to Expired, seat released, payments resolved.
    pub swept: usize,
    /// Reservations another transition won before the sweep landed.
    pub skipped: usize,
    /// Reservations whose sweep failed partway; picked up next cycle or
    /// by reconcile.
    pub failed: usize,
}

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub seats_confirmed: usize,
    pub seats_released: usize,
    pub failed: usize,
}

/// Orchestrates the seat, reservation and payment state machines.
///
/// The machines themselves only ever answer "applied" or "invalid from my
/// current state"; every multi-entity rule, every compensation and every
/// race resolution lives here and nowhere else.
pub struct BookingEngine {
    seats: Arc<dyn SeatStore>,
    reservations: Arc<dyn ReservationLedger>,
    payments: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn EventNotifier>,
    rules: BookingRules,
}

impl BookingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seats: Arc<dyn SeatStore>,
        reservations: Arc<dyn ReservationLedger>,
        payments: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn EventNotifier>,
        rules: BookingRules,
    ) -> Self {
        Self {
            seats,
            reservations,
            payments,
            gateway,
            clock,
            notifier,
            rules,
        }
    }

    /// Claim a seat for `user_id` and open a Held reservation on it.
    ///
    /// The seat hold is the serialization point: of any number of
    /// concurrent claims on one seat, exactly one caller gets the
    /// reservation back and every other gets `SeatAlreadyReserved`.
    pub async fn reserve_seat(
        &self,
        user_id: Uuid,
        concert_id: Uuid,
        seat_id: Uuid,
    ) -> Result<Reservation, BookingError> {
        if user_id.is_nil() || concert_id.is_nil() || seat_id.is_nil() {
            return Err(BookingError::Validation(
                "user, concert and seat ids are required".to_string(),
            ));
        }

        // 1. Existence and concert match, before any state changes.
        let seat = self
            .seats
            .get(seat_id)
            .await
            .map_err(Self::map_seat_error)?
            .ok_or(BookingError::SeatNotFound(seat_id))?;
        if seat.concert_id != concert_id {
            return Err(BookingError::Validation(format!(
                "seat {} does not belong to concert {}",
                seat_id, concert_id
            )));
        }

        // 2. Atomic claim. The reservation id is minted up front so the
        //    seat can record which reservation holds it.
        let reservation_id = Uuid::new_v4();
        let held = match self.seats.hold(seat_id, reservation_id).await {
            Ok(held) => held,
            Err(SeatError::Unavailable(_)) => {
                return Err(BookingError::SeatAlreadyReserved(seat_id))
            }
            Err(SeatError::NotFound(_)) => return Err(BookingError::SeatNotFound(seat_id)),
            Err(err) => return Err(Self::map_seat_error(err)),
        };

        // 3. Record the reservation with the price snapshotted from the
        //    seat as held. A failure here must not leave the hold behind.
        let now = self.clock.now();
        let reservation = Reservation::new(reservation_id, user_id, &held, now, self.rules.hold_window());
        if let Err(err) = self.reservations.insert(&reservation).await {
            self.release_or_alert(seat_id, reservation_id, "reservation insert failed")
                .await?;
            return Err(BookingError::Storage(err.to_string()));
        }

        info!(%reservation_id, %seat_id, %user_id, expires_at = %reservation.expires_at, "seat reserved");
        self.emit(ReservationEvent::ReservationCreated {
            reservation_id,
            user_id,
            concert_id,
            seat_id,
            price: reservation.price,
            expires_at: reservation.expires_at,
        })
        .await;

        Ok(reservation)
    }

    /// Pay for a held reservation. On success the reservation and its seat
    /// both end up Confirmed; on a declined charge the reservation stays
    /// Held so the user can retry until the hold window runs out.
    pub async fn process_payment(
        &self,
        reservation_id: Uuid,
        method: PaymentMethod,
    ) -> Result<Payment, BookingError> {
        // 1. Load and guard. This read-then-act check is advisory; the
        //    conditional saves below settle any race with the sweep.
        let reservation = self
            .reservations
            .get(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;

        let now = self.clock.now();
        if reservation.status != ReservationStatus::Held {
            return Err(BookingError::InvalidReservationState(format!(
                "reservation {} is {:?}, expected HELD",
                reservation_id, reservation.status
            )));
        }
        if reservation.is_expired(now) {
            return Err(BookingError::InvalidReservationState(format!(
                "reservation {} expired at {}",
                reservation_id, reservation.expires_at
            )));
        }
        if reservation.price <= 0 {
            return Err(BookingError::Validation(format!(
                "reservation {} has non-positive amount {}",
                reservation_id, reservation.price
            )));
        }

        // 2. One open attempt at a time; a retry is only valid after the
        //    previous attempt failed.
        let open_attempt = self
            .payments
            .find_by_reservation(reservation_id)
            .await?
            .into_iter()
            .find(Payment::is_open);
        if let Some(existing) = open_attempt {
            return Err(BookingError::InvalidReservationState(format!(
                "payment {} already {:?} for reservation {}",
                existing.id, existing.status, reservation_id
            )));
        }

        // 3. Funds probe before any state is written.
        let available = match self.gateway_deadline(self.gateway.balance(reservation.user_id)).await {
            Some(Ok(balance)) => balance,
            Some(Err(err)) => {
                return Err(BookingError::PaymentProcessingFailed(err.to_string()))
            }
            None => {
                return Err(BookingError::PaymentProcessingFailed(
                    "balance check timed out".to_string(),
                ))
            }
        };
        if available < reservation.price {
            return Err(BookingError::InsufficientBalance {
                required: reservation.price,
                available,
            });
        }

        // 4. Open the attempt, then charge.
        let mut payment = Payment::new(&reservation, method, now);
        self.payments.insert(&payment).await?;

        let charged = match self
            .gateway_deadline(self.gateway.charge(reservation.user_id, payment.amount, method))
            .await
        {
            Some(result) => result,
            None => {
                self.settle_failed_charge(&mut payment, "charge timed out").await;
                return Err(BookingError::PaymentProcessingFailed(
                    "charge timed out".to_string(),
                ));
            }
        };

        match charged {
            Ok(transaction_id) => {
                let now = self.clock.now();
                if payment.complete(transaction_id, now).is_err() {
                    // Freshly inserted rows are Pending; anything else here
                    // means the attempt was tampered with.
                    return Err(BookingError::Inconsistent(format!(
                        "payment {} refused completion",
                        payment.id
                    )));
                }
                if !self
                    .payments
                    .save_if_status(&payment, PaymentStatus::Pending)
                    .await?
                {
                    // The sweep voided this attempt while the charge was in
                    // flight. The row is terminal and carries no transaction
                    // id, so returning the money is on us.
                    warn!(payment_id = %payment.id, %reservation_id, "attempt voided mid-charge, refunding");
                    if let Some(txn) = payment.transaction_id.as_deref() {
                        self.refund_with_retry(txn, "reservation expired during payment").await;
                    }
                    return Err(BookingError::InvalidReservationState(format!(
                        "reservation {} expired, please reserve again",
                        reservation_id
                    )));
                }
                self.finalize_confirmation(reservation, payment).await
            }
            Err(ChargeError::InsufficientFunds { required, available }) => {
                self.settle_failed_charge(&mut payment, "insufficient funds").await;
                Err(BookingError::InsufficientBalance { required, available })
            }
            Err(err) => {
                self.settle_failed_charge(&mut payment, &err.to_string()).await;
                Err(BookingError::PaymentProcessingFailed(err.to_string()))
            }
        }
    }

    /// Cancel a reservation on behalf of its owner. Held and Confirmed
    /// reservations both cancel; a confirmed one gets its charge refunded.
    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Reservation, BookingError> {
        let mut reservation = self
            .reservations
            .get(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;

        // 1. Domain transition: ownership and status guards.
        let now = self.clock.now();
        let previous = reservation.status;
        reservation.cancel(user_id, now).map_err(|err| match err {
            ReservationError::NotOwner { .. } => BookingError::Unauthorized(format!(
                "reservation {} does not belong to user {}",
                reservation_id, user_id
            )),
            other => BookingError::InvalidReservationState(other.to_string()),
        })?;

        // 2. Land it; the sweep may have expired the row in the meantime.
        if !self
            .reservations
            .save_if_status(&reservation, previous)
            .await?
        {
            return Err(BookingError::InvalidReservationState(format!(
                "reservation {} changed state concurrently",
                reservation_id
            )));
        }

        // 3. Free the seat. The cancel has landed, so a release failure is
        //    repair work for reconcile, not a reason to fail the call.
        if let Err(err) = self
            .release_or_alert(reservation.seat_id, reservation.id, "cancel")
            .await
        {
            warn!(%reservation_id, error = %err, "seat release deferred to reconcile");
        }

        // 4. Settle money: void a pending attempt, refund a settled one.
        let refunded = self
            .resolve_open_payments(&reservation, "reservation cancelled")
            .await;

        info!(%reservation_id, from = ?previous, refunded, "reservation cancelled");
        self.emit(ReservationEvent::ReservationCancelled {
            reservation_id,
            seat_id: reservation.seat_id,
            refunded,
            cancelled_at: now,
        })
        .await;

        Ok(reservation)
    }

    /// Expire every Held reservation whose hold window has elapsed.
    ///
    /// Each reservation is processed independently; one failure never
    /// blocks the rest of the sweep. Running the sweep twice over the same
    /// backlog is safe: the compare-and-save hands each reservation to
    /// exactly one sweep, and refunds are claimed the same way.
    pub async fn sweep_expired_reservations(&self) -> Result<SweepReport, BookingError> {
        let now = self.clock.now();
        let due = self.reservations.find_expired_held(now).await?;
        let mut report = SweepReport::default();

        for mut reservation in due {
            match reservation.expire(now) {
                Ok(true) => {}
                Ok(false) => {
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    // Not actually due; disagreeing clocks. Next cycle.
                    warn!(reservation_id = %reservation.id, error = %err, "sweep skipped reservation");
                    report.skipped += 1;
                    continue;
                }
            }

            match self
                .reservations
                .save_if_status(&reservation, ReservationStatus::Held)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    // A cancel or confirmation won the race.
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    error!(reservation_id = %reservation.id, error = %err, "sweep could not land expiry");
                    report.failed += 1;
                    continue;
                }
            }

            if let Err(err) = self
                .release_or_alert(reservation.seat_id, reservation.id, "expiry sweep")
                .await
            {
                error!(reservation_id = %reservation.id, error = %err, "expired reservation still holds its seat");
                report.failed += 1;
            } else {
                report.swept += 1;
            }

            self.resolve_open_payments(&reservation, "reservation expired")
                .await;

            self.emit(ReservationEvent::ReservationExpired {
                reservation_id: reservation.id,
                seat_id: reservation.seat_id,
                expired_at: now,
            })
            .await;
        }

        if report.swept > 0 || report.failed > 0 {
            info!(
                swept = report.swept,
                skipped = report.skipped,
                failed = report.failed,
                "expiry sweep finished"
            );
        }
        Ok(report)
    }

    /// Repair pass for the damage compensation could not undo in line:
    /// confirmed reservations whose seat is still Held, and terminal
    /// reservations whose seat was never released. Idempotent, runs from
    /// the same scheduler as the sweep.
    pub async fn reconcile(&self) -> Result<ReconcileReport, BookingError> {
        let mut report = ReconcileReport::default();

        // 1. Confirmed reservation, seat still Held by it: finish the job.
        for reservation in self
            .reservations
            .find_by_status(ReservationStatus::Confirmed)
            .await?
        {
            match self.seats.get(reservation.seat_id).await {
                Ok(Some(seat))
                    if seat.status == SeatStatus::Held && seat.holder == Some(reservation.id) =>
                {
                    match self.seats.confirm(reservation.seat_id, reservation.id).await {
                        Ok(()) => {
                            info!(reservation_id = %reservation.id, seat_id = %reservation.seat_id, "reconcile confirmed seat");
                            report.seats_confirmed += 1;
                        }
                        Err(err) => {
                            error!(reservation_id = %reservation.id, error = %err, "reconcile could not confirm seat");
                            report.failed += 1;
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    error!(reservation_id = %reservation.id, error = %err, "reconcile could not read seat");
                    report.failed += 1;
                }
            }
        }

        // 2. Terminal reservation still occupying its seat: free it.
        for status in [ReservationStatus::Cancelled, ReservationStatus::Expired] {
            for reservation in self.reservations.find_by_status(status).await? {
                match self.seats.get(reservation.seat_id).await {
                    Ok(Some(seat)) if seat.holder == Some(reservation.id) => {
                        match self.seats.release(reservation.seat_id, reservation.id).await {
                            Ok(()) => {
                                info!(reservation_id = %reservation.id, seat_id = %reservation.seat_id, "reconcile released seat");
                                report.seats_released += 1;
                            }
                            Err(err) => {
                                error!(reservation_id = %reservation.id, error = %err, "reconcile could not release seat");
                                report.failed += 1;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!(reservation_id = %reservation.id, error = %err, "reconcile could not read seat");
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Reservations for one user, most recent first.
    pub async fn list_reservations(&self, user_id: Uuid) -> Result<Vec<Reservation>, BookingError> {
        let mut rows = self.reservations.list_by_user(user_id).await?;
        rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(rows)
    }

    // Confirmation lands reservation-first: a Confirmed reservation with a
    // Held seat is detectable and repairable, while a Confirmed seat with
    // no confirmed reservation behind it would lie to customers.
    async fn finalize_confirmation(
        &self,
        mut reservation: Reservation,
        payment: Payment,
    ) -> Result<Payment, BookingError> {
        let now = self.clock.now();
        if let Err(err) = reservation.confirm(&payment, now) {
            // The hold lapsed while the charge settled.
            self.refund_settled(&payment, "confirmation rejected").await;
            return Err(BookingError::InvalidReservationState(format!(
                "reservation {} could not be confirmed: {}",
                reservation.id, err
            )));
        }

        match self
            .reservations
            .save_if_status(&reservation, ReservationStatus::Held)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // The sweep expired the row first and will never revisit
                // it, so this charge is ours to unwind.
                warn!(reservation_id = %reservation.id, "lost confirmation race, refunding charge");
                self.refund_settled(&payment, "reservation expired during payment").await;
                return Err(BookingError::InvalidReservationState(format!(
                    "reservation {} expired, please reserve again",
                    reservation.id
                )));
            }
            Err(err) => {
                self.refund_settled(&payment, "confirmation could not be saved").await;
                return Err(BookingError::Storage(err.to_string()));
            }
        }

        // Seat finalization. The reservation is already Confirmed, so a
        // failure here is repair work for reconcile, not a user failure.
        if let Err(err) = self
            .confirm_seat_with_retry(reservation.seat_id, reservation.id)
            .await
        {
            error!(
                reservation_id = %reservation.id,
                seat_id = %reservation.seat_id,
                error = %err,
                "reservation confirmed but seat confirmation failed"
            );
        }

        info!(
            reservation_id = %reservation.id,
            payment_id = %payment.id,
            amount = payment.amount,
            method = payment.method.as_str(),
            "reservation confirmed"
        );
        self.emit(ReservationEvent::ReservationConfirmed {
            reservation_id: reservation.id,
            seat_id: reservation.seat_id,
            payment_id: payment.id,
            amount: payment.amount,
            confirmed_at: now,
        })
        .await;

        Ok(payment)
    }

    /// Mark a pending attempt Failed. Best effort: the caller's error is
    /// the one the user must see, so bookkeeping trouble is only logged.
    async fn settle_failed_charge(&self, payment: &mut Payment, reason: &str) {
        let now = self.clock.now();
        if payment.fail(reason, now).is_err() {
            return;
        }
        match self
            .payments
            .save_if_status(payment, PaymentStatus::Pending)
            .await
        {
            Ok(true) => info!(payment_id = %payment.id, reason, "payment attempt failed"),
            Ok(false) => warn!(payment_id = %payment.id, "failed attempt was already resolved"),
            Err(err) => {
                error!(payment_id = %payment.id, error = %err, "could not record failed attempt")
            }
        }
    }

    /// Refund one Success row. The Success -> Cancelled compare-and-save
    /// claims the row before the gateway is called, so of any racing
    /// resolvers (user cancel, sweep, a lost confirmation race) exactly
    /// one performs the refund and none duplicate it.
    async fn refund_settled(&self, payment: &Payment, reason: &str) -> bool {
        let mut claimed = payment.clone();
        if claimed.refund(reason, self.clock.now()).is_err() {
            return false;
        }
        match self
            .payments
            .save_if_status(&claimed, PaymentStatus::Success)
            .await
        {
            Ok(true) => {}
            Ok(false) => return false, // another resolver owns this refund
            Err(err) => {
                error!(payment_id = %payment.id, error = %err, "could not claim payment row for refund");
                return false;
            }
        }
        if let Some(txn) = claimed.transaction_id.as_deref() {
            self.refund_with_retry(txn, reason).await;
        }
        true
    }

    /// Gateway-side refund with bounded backoff. Exhaustion is money the
    /// system owes a customer, which must never pass silently.
    async fn refund_with_retry(&self, transaction_id: &str, reason: &str) -> bool {
        let mut backoff = Duration::from_millis(self.rules.compensation_backoff_ms);
        for attempt in 1..=self.rules.compensation_max_attempts {
            match self
                .gateway_deadline(self.gateway.refund(transaction_id, reason))
                .await
            {
                Some(Ok(())) => return true,
                Some(Err(RefundError::AlreadyRefunded(_))) => return true,
                Some(Err(err)) => {
                    warn!(transaction_id, attempt, error = %err, "refund attempt failed")
                }
                None => warn!(transaction_id, attempt, "refund attempt timed out"),
            }
            if attempt < self.rules.compensation_max_attempts {
                sleep(backoff).await;
                backoff *= 2;
            }
        }
        error!(
            transaction_id,
            reason, "UNREFUNDED CHARGE: refund retries exhausted, manual reconciliation required"
        );
        false
    }

    /// Resolve every open payment of a reservation leaving Held or
    /// Confirmed: Pending rows are voided, Success rows refunded. Returns
    /// whether any money actually went back.
    async fn resolve_open_payments(&self, reservation: &Reservation, reason: &str) -> bool {
        let rows = match self.payments.find_by_reservation(reservation.id).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(reservation_id = %reservation.id, error = %err, "payment lookup failed during resolution");
                return false;
            }
        };

        let mut refunded = false;
        let now = self.clock.now();
        for mut payment in rows {
            match payment.status {
                PaymentStatus::Pending => {
                    if payment.fail(reason, now).is_err() {
                        continue;
                    }
                    match self
                        .payments
                        .save_if_status(&payment, PaymentStatus::Pending)
                        .await
                    {
                        Ok(true) => info!(payment_id = %payment.id, reason, "pending attempt voided"),
                        Ok(false) => {
                            warn!(payment_id = %payment.id, "pending attempt advanced concurrently")
                        }
                        Err(err) => {
                            error!(payment_id = %payment.id, error = %err, "could not void pending attempt")
                        }
                    }
                }
                PaymentStatus::Success => {
                    refunded |= self.refund_settled(&payment, reason).await;
                }
                PaymentStatus::Failed | PaymentStatus::Cancelled => {}
            }
        }
        refunded
    }

    /// Compensating release for a hold that must not outlive this call.
    async fn release_or_alert(
        &self,
        seat_id: Uuid,
        holder: Uuid,
        context: &str,
    ) -> Result<(), BookingError> {
        let mut backoff = Duration::from_millis(self.rules.compensation_backoff_ms);
        let mut last_error = String::new();
        for attempt in 1..=self.rules.compensation_max_attempts {
            match self.seats.release(seat_id, holder).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(%seat_id, %holder, attempt, error = %err, "compensating release failed");
                    last_error = err.to_string();
                }
            }
            if attempt < self.rules.compensation_max_attempts {
                sleep(backoff).await;
                backoff *= 2;
            }
        }
        error!(
            %seat_id,
            %holder,
            context,
            error = %last_error,
            "ORPHANED HOLD: compensating release exhausted retries"
        );
        Err(BookingError::Inconsistent(format!(
            "seat {} could not be released after {}: {}",
            seat_id, context, last_error
        )))
    }

    async fn confirm_seat_with_retry(&self, seat_id: Uuid, holder: Uuid) -> Result<(), SeatError> {
        let mut backoff = Duration::from_millis(self.rules.compensation_backoff_ms);
        let mut last_error = None;
        for attempt in 1..=self.rules.compensation_max_attempts {
            match self.seats.confirm(seat_id, holder).await {
                Ok(()) => return Ok(()),
                Err(err @ SeatError::Backend(_)) => {
                    warn!(%seat_id, attempt, error = %err, "seat confirmation attempt failed");
                    last_error = Some(err);
                }
                // State mismatches will not heal by retrying.
                Err(err) => return Err(err),
            }
            if attempt < self.rules.compensation_max_attempts {
                sleep(backoff).await;
                backoff *= 2;
            }
        }
        Err(last_error.unwrap_or(SeatError::Backend("retries exhausted".to_string())))
    }

    async fn gateway_deadline<T>(&self, call: impl Future<Output = T>) -> Option<T> {
        timeout(Duration::from_millis(self.rules.gateway_timeout_ms), call)
            .await
            .ok()
    }

    /// Best-effort emission; delivery never gates a transition.
    async fn emit(&self, event: ReservationEvent) {
        if let Err(err) = self.notifier.publish(&event).await {
            warn!(event = event.name(), error = %err, "event notification dropped");
        }
    }

    fn map_seat_error(err: SeatError) -> BookingError {
        match err {
            SeatError::NotFound(id) => BookingError::SeatNotFound(id),
            SeatError::Unavailable(id) => BookingError::SeatAlreadyReserved(id),
            other => BookingError::Storage(other.to_string()),
        }
    }
}
