//! Seat inventory ledger.
//!
//! Counts are tracked per (train, date, class) and only ever change through
//! [`reserve`] and [`release`]. Both run inside the caller's unit of work, so
//! the decrement commits or rolls back together with whatever booking change
//! accompanies it.

use rail_core::models::{LedgerKey, SeatAvailability};
use rail_core::repository::{SeatDebit, UnitOfWork};
use rail_core::{BookingError, BookingResult};
use tracing::debug;

/// Longest class name the stores accept (`seat_class VARCHAR(20)`).
pub const MAX_CLASS_LEN: usize = 20;

/// Counts are stored as `INTEGER`.
pub const MAX_SEAT_COUNT: u32 = i32::MAX as u32;

/// Rejects keys and counts no store could hold, before any store is touched.
pub fn validate(key: &LedgerKey, count: u32) -> BookingResult<()> {
    if count == 0 {
        return Err(BookingError::InvalidRequest("seat count must be positive".to_string()));
    }
    if count > MAX_SEAT_COUNT {
        return Err(BookingError::InvalidRequest(format!(
            "seat count {} is out of range",
            count
        )));
    }
    if key.class.trim().is_empty() {
        return Err(BookingError::InvalidRequest("class is required".to_string()));
    }
    if key.class.chars().count() > MAX_CLASS_LEN {
        return Err(BookingError::InvalidRequest(format!(
            "class must be at most {} characters",
            MAX_CLASS_LEN
        )));
    }
    Ok(())
}

/// Take `count` seats from `key`, creating the ledger row on first use.
pub async fn reserve(
    uow: &mut dyn UnitOfWork,
    key: &LedgerKey,
    count: u32,
) -> BookingResult<SeatAvailability> {
    validate(key, count)?;

    if uow.seat_availability(key).await?.is_none() {
        let train = uow
            .train(key.train_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("train {}", key.train_id)))?;
        let seats_total = train.seat_capacity(&key.class)?;
        debug!("Seeding ledger for {} with {} seats", key, seats_total);
        // Insert-if-absent: a concurrent seeder for the same key is harmless.
        uow.seed_seats(key, seats_total).await?;
    }

    match uow.debit_seats(key, count).await? {
        SeatDebit::Debited(availability) => Ok(availability),
        SeatDebit::Insufficient { available } => Err(BookingError::InsufficientInventory {
            requested: count,
            available,
        }),
        SeatDebit::Missing => Err(BookingError::UnknownInventoryKey(key.clone())),
    }
}

/// Give `count` seats back to `key`. The row must already exist.
pub async fn release(
    uow: &mut dyn UnitOfWork,
    key: &LedgerKey,
    count: u32,
) -> BookingResult<SeatAvailability> {
    validate(key, count)?;

    uow.credit_seats(key, count)
        .await?
        .ok_or_else(|| BookingError::UnknownInventoryKey(key.clone()))
}

/// `None` means the key has never been reserved against, not zero seats.
pub async fn seats_remaining(
    uow: &mut dyn UnitOfWork,
    key: &LedgerKey,
) -> BookingResult<Option<u32>> {
    Ok(uow.seat_availability(key).await?.map(|a| a.seats_left))
}
