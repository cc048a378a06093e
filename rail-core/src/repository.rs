use async_trait::async_trait;
use rail_catalog::{NewTrain, Train};
use uuid::Uuid;

use crate::models::{
    Booking, DailyBookingSummary, LedgerKey, Payment, PaymentRecordStatus, SeatAvailability,
};
use crate::StoreResult;

/// Result of a conditional seat decrement.
#[derive(Debug, Clone, PartialEq)]
pub enum SeatDebit {
    Debited(SeatAvailability),
    Insufficient { available: u32 },
    /// No ledger row for the key.
    Missing,
}

/// Repository trait for the train catalog
#[async_trait]
pub trait TrainCatalog: Send + Sync {
    /// Fails with `Constraint` on a duplicate `train_no`.
    async fn add_train(&self, train: NewTrain) -> StoreResult<Train>;

    /// Ordered by id.
    async fn list_trains(&self) -> StoreResult<Vec<Train>>;
}

/// Entry point to booking persistence.
///
/// Every mutation of seats, bookings and payments goes through a
/// [`UnitOfWork`] obtained from [`BookingStore::begin`]; the remaining
/// methods are plain reads outside any transaction.
#[async_trait]
pub trait BookingStore: TrainCatalog {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    async fn seat_availability(&self, key: &LedgerKey) -> StoreResult<Option<SeatAvailability>>;

    async fn find_booking(&self, pnr: &str) -> StoreResult<Option<Booking>>;

    /// Bookings and revenue grouped by creation date (UTC), oldest first.
    async fn daily_report(&self) -> StoreResult<Vec<DailyBookingSummary>>;
}

/// One transaction. Dropping it without `commit` discards every change.
///
/// Writes made through one unit of work are invisible to others until
/// commit, and seat rows touched by it stay locked until it finishes.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn train(&mut self, train_id: i64) -> StoreResult<Option<Train>>;

    async fn seat_availability(&mut self, key: &LedgerKey) -> StoreResult<Option<SeatAvailability>>;

    /// Create the ledger row with `seats_left = seats_total` unless it exists.
    async fn seed_seats(&mut self, key: &LedgerKey, seats_total: u32) -> StoreResult<()>;

    /// Subtract `count` only if at least `count` seats are left.
    async fn debit_seats(&mut self, key: &LedgerKey, count: u32) -> StoreResult<SeatDebit>;

    /// Add `count` back; `None` when there is no row for the key.
    async fn credit_seats(
        &mut self,
        key: &LedgerKey,
        count: u32,
    ) -> StoreResult<Option<SeatAvailability>>;

    async fn pnr_exists(&mut self, pnr: &str) -> StoreResult<bool>;

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()>;

    /// Load a booking and lock it against concurrent modification.
    async fn booking_for_update(&mut self, pnr: &str) -> StoreResult<Option<Booking>>;

    /// Persist status, payment status and refund fields of an existing booking.
    async fn save_booking(&mut self, booking: &Booking) -> StoreResult<()>;

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()>;

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> StoreResult<Option<Payment>>;

    async fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentRecordStatus,
    ) -> StoreResult<()>;

    async fn commit(&mut self) -> StoreResult<()>;

    async fn rollback(&mut self) -> StoreResult<()>;
}
