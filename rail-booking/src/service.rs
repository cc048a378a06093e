use chrono::{NaiveDate, Utc};
use rail_core::models::LedgerKey;
use rail_core::payment::{ChargeReceipt, ChargeStatus, PaymentGateway};
use rail_core::pnr::generate_pnr;
use rail_core::refund::{self, RefundQuote};
use rail_core::repository::{BookingStore, UnitOfWork};
use rail_core::{
    Booking, BookingError, BookingResult, DailyBookingSummary, Payment, PaymentRecordStatus,
    Requester,
};
use rail_shared::{BookingCancelledEvent, BookingConfirmedEvent, BookingEvent};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ledger;

/// Knobs for booking creation, usually taken from the `[booking]` config section.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub pnr_attempts: u32,
    pub currency: String,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            pnr_attempts: 5,
            currency: "INR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
    pub seat_count: u32,
}

impl NewBooking {
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.train_id, self.travel_date, self.class.clone())
    }
}

/// Outcome of a successful cancellation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub booking: Booking,
    pub refund: RefundQuote,
    pub seats_left: u32,
}

/// Drives bookings through PENDING_PAYMENT -> CONFIRMED -> CANCELLED.
///
/// Every mutating call runs in a single unit of work: the seat ledger, the
/// booking row and the payment row commit together or not at all.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
    events: broadcast::Sender<BookingEvent>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
        policy: BookingPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            store,
            gateway,
            events,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    /// Committed booking changes, in commit order per receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    pub async fn create(
        &self,
        request: NewBooking,
        requester: &Requester,
    ) -> BookingResult<Booking> {
        ledger::validate(&request.ledger_key(), request.seat_count)?;

        let mut uow = self.store.begin().await?;
        let mut charged = None;
        let outcome = self
            .create_in(uow.as_mut(), &request, requester, &mut charged)
            .await;
        let (booking, seats_left) = match finish(uow.as_mut(), outcome).await {
            Ok(done) => done,
            Err(err) => {
                if let Some(receipt) = charged {
                    self.void_charge(&receipt, &err).await;
                }
                return Err(err);
            }
        };

        info!(
            "Booking {} confirmed: {} x {} on train {} ({})",
            booking.pnr, booking.seat_count, booking.class, booking.train_id, booking.travel_date
        );
        self.publish(BookingEvent::Confirmed(BookingConfirmedEvent {
            booking_id: booking.id,
            pnr: booking.pnr.clone(),
            user_id: booking.user_id.clone(),
            train_id: booking.train_id,
            travel_date: booking.travel_date,
            class: booking.class.clone(),
            seat_count: booking.seat_count,
            total_fare: booking.total_fare,
            seats_left,
            timestamp: Utc::now().timestamp(),
        }));

        Ok(booking)
    }

    async fn create_in(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &NewBooking,
        requester: &Requester,
        charged: &mut Option<ChargeReceipt>,
    ) -> BookingResult<(Booking, u32)> {
        let key = request.ledger_key();
        let availability = ledger::reserve(uow, &key, request.seat_count).await?;

        let train = uow
            .train(key.train_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("train {}", key.train_id)))?;
        let fare = train.quote(&key.class, request.seat_count)?;

        let pnr = self.allocate_pnr(uow).await?;
        let mut booking = Booking::new(
            pnr,
            requester.user_id.clone(),
            &key,
            request.seat_count,
            fare.fare_per_seat,
            fare.total_fare,
        );
        uow.insert_booking(&booking).await?;

        let receipt = self
            .gateway
            .charge(&booking, &self.policy.currency)
            .await
            .map_err(|e| BookingError::PaymentGateway(e.to_string()))?;
        if receipt.status == ChargeStatus::Declined {
            let reason = receipt.reason.unwrap_or_else(|| "declined".to_string());
            warn!("Payment for {} declined: {}", booking.pnr, reason);
            return Err(BookingError::PaymentDeclined(reason));
        }
        // From here on a failure must hand the money back
        *charged = Some(receipt.clone());

        uow.insert_payment(&Payment {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            provider: receipt.provider,
            provider_payment_id: receipt.provider_payment_id,
            amount: receipt.amount,
            currency: receipt.currency,
            status: PaymentRecordStatus::Success,
            created_at: Utc::now(),
        })
        .await?;

        booking.confirm();
        uow.save_booking(&booking).await?;

        Ok((booking, availability.seats_left))
    }

    /// Refunds a captured charge whose booking did not commit.
    async fn void_charge(&self, receipt: &ChargeReceipt, cause: &BookingError) {
        warn!(
            "Refunding charge {} after failed booking: {}",
            receipt.provider_payment_id, cause
        );
        if let Err(e) = self
            .gateway
            .refund(&receipt.provider_payment_id, receipt.amount)
            .await
        {
            error!(
                "Compensating refund of {} on {} failed: {}",
                receipt.amount, receipt.provider_payment_id, e
            );
        }
    }

    async fn allocate_pnr(&self, uow: &mut dyn UnitOfWork) -> BookingResult<String> {
        for _ in 0..self.policy.pnr_attempts {
            let candidate = generate_pnr();
            if !uow.pnr_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(BookingError::Configuration(format!(
            "could not allocate a unique PNR in {} attempts",
            self.policy.pnr_attempts
        )))
    }

    pub async fn cancel(&self, pnr: &str, requester: &Requester) -> BookingResult<Cancellation> {
        self.cancel_on(pnr, requester, Utc::now().date_naive()).await
    }

    /// Cancel as if today were `today`; the refund tier depends on it.
    pub async fn cancel_on(
        &self,
        pnr: &str,
        requester: &Requester,
        today: NaiveDate,
    ) -> BookingResult<Cancellation> {
        let mut uow = self.store.begin().await?;
        let outcome = self.cancel_in(uow.as_mut(), pnr, requester, today).await;
        let cancellation = finish(uow.as_mut(), outcome).await?;

        let booking = &cancellation.booking;
        info!(
            "Booking {} cancelled, refund {} ({} days before travel)",
            booking.pnr, cancellation.refund.amount, cancellation.refund.days_before
        );
        self.publish(BookingEvent::Cancelled(BookingCancelledEvent {
            booking_id: booking.id,
            pnr: booking.pnr.clone(),
            train_id: booking.train_id,
            travel_date: booking.travel_date,
            class: booking.class.clone(),
            seat_count: booking.seat_count,
            refund_amount: cancellation.refund.amount,
            seats_left: cancellation.seats_left,
            timestamp: Utc::now().timestamp(),
        }));

        Ok(cancellation)
    }

    async fn cancel_in(
        &self,
        uow: &mut dyn UnitOfWork,
        pnr: &str,
        requester: &Requester,
        today: NaiveDate,
    ) -> BookingResult<Cancellation> {
        let mut booking = uow
            .booking_for_update(pnr)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", pnr)))?;

        if !booking.is_visible_to(requester) {
            return Err(BookingError::Forbidden(format!(
                "booking {} belongs to another user",
                pnr
            )));
        }
        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled(pnr.to_string()));
        }

        let quote = refund::quote(booking.total_fare, booking.travel_date, today);
        booking.cancel(quote.amount, Utc::now());
        uow.save_booking(&booking).await?;

        let payment = uow.payment_for_booking(booking.id).await?;
        if let Some(payment) = &payment {
            uow.set_payment_status(payment.id, PaymentRecordStatus::Refunded)
                .await?;
        }

        let availability = ledger::release(uow, &booking.ledger_key(), booking.seat_count).await?;

        // Money leaves last, once every store change has been staged
        if let Some(payment) = payment {
            self.gateway
                .refund(&payment.provider_payment_id, quote.amount)
                .await
                .map_err(|e| BookingError::PaymentGateway(e.to_string()))?;
        }

        Ok(Cancellation {
            booking,
            refund: quote,
            seats_left: availability.seats_left,
        })
    }

    pub async fn get(&self, pnr: &str, requester: &Requester) -> BookingResult<Booking> {
        let booking = self
            .store
            .find_booking(pnr)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", pnr)))?;

        if !booking.is_visible_to(requester) {
            return Err(BookingError::Forbidden(format!(
                "booking {} belongs to another user",
                pnr
            )));
        }
        Ok(booking)
    }

    /// Seats left on `key`, or `None` if nothing has been booked there yet.
    pub async fn availability(&self, key: &LedgerKey) -> BookingResult<Option<u32>> {
        let mut uow = self.store.begin().await?;
        let outcome = ledger::seats_remaining(uow.as_mut(), key).await;
        // read-only
        uow.rollback().await?;
        outcome
    }

    pub async fn daily_report(
        &self,
        requester: &Requester,
    ) -> BookingResult<Vec<DailyBookingSummary>> {
        if !requester.is_admin {
            return Err(BookingError::Forbidden("admin only".to_string()));
        }
        Ok(self.store.daily_report().await?)
    }

    fn publish(&self, event: BookingEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Commit on success, roll back on failure. A failed rollback is logged and
/// the original error returned.
async fn finish<T>(uow: &mut dyn UnitOfWork, outcome: BookingResult<T>) -> BookingResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!("Rollback failed after {}: {}", err, rollback_err);
            }
            if err.is_transient() {
                warn!("Unit of work hit contention: {}", err);
            }
            Err(err)
        }
    }
}
