//! In-process store used for demos and tests.
//!
//! A unit of work takes the single store lock for its whole lifetime and
//! stages its writes on a copy of the tables; commit swaps the copy in.
//! Units of work are therefore fully serialized, which trivially gives the
//! per-key serialization the seat ledger needs.

use async_trait::async_trait;
use chrono::Utc;
use rail_catalog::{NewTrain, Train};
use rail_core::models::{
    Booking, DailyBookingSummary, LedgerKey, Payment, PaymentRecordStatus, SeatAvailability,
};
use rail_core::repository::{BookingStore, SeatDebit, TrainCatalog, UnitOfWork};
use rail_core::{StoreError, StoreResult};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct Tables {
    trains: BTreeMap<i64, Train>,
    next_train_id: i64,
    seats: HashMap<LedgerKey, SeatAvailability>,
    bookings: HashMap<String, Booking>,
    payments: HashMap<Uuid, Payment>,
}

impl Tables {
    fn seed(&mut self, key: &LedgerKey, seats_total: u32) {
        self.seats.entry(key.clone()).or_insert_with(|| SeatAvailability {
            key: key.clone(),
            seats_left: seats_total,
            seats_total,
            updated_at: Utc::now(),
        });
    }

    fn debit(&mut self, key: &LedgerKey, count: u32) -> SeatDebit {
        match self.seats.get_mut(key) {
            None => SeatDebit::Missing,
            Some(row) if row.seats_left < count => SeatDebit::Insufficient {
                available: row.seats_left,
            },
            Some(row) => {
                row.seats_left -= count;
                row.updated_at = Utc::now();
                SeatDebit::Debited(row.clone())
            }
        }
    }

    fn credit(&mut self, key: &LedgerKey, count: u32) -> StoreResult<Option<SeatAvailability>> {
        let Some(row) = self.seats.get_mut(key) else {
            return Ok(None);
        };
        row.seats_left = row
            .seats_left
            .checked_add(count)
            .ok_or_else(|| StoreError::Constraint(format!("seat count overflow for {}", key)))?;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    lock_timeout: Duration,
}

impl MemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables {
                next_train_id: 1,
                ..Default::default()
            })),
            lock_timeout,
        }
    }

    async fn lock(&self) -> StoreResult<OwnedMutexGuard<Tables>> {
        tokio::time::timeout(self.lock_timeout, self.tables.clone().lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!("Memory store lock not acquired within {:?}", self.lock_timeout);
                StoreError::Contention(format!(
                    "store lock not acquired within {}ms",
                    self.lock_timeout.as_millis()
                ))
            })
    }
}

#[async_trait]
impl TrainCatalog for MemoryStore {
    async fn add_train(&self, train: NewTrain) -> StoreResult<Train> {
        let mut tables = self.lock().await?;
        if tables.trains.values().any(|t| t.train_no == train.train_no) {
            return Err(StoreError::Constraint(format!(
                "train_no {} already exists",
                train.train_no
            )));
        }

        let id = tables.next_train_id;
        tables.next_train_id += 1;
        let train = train.into_train(id, Utc::now());
        tables.trains.insert(id, train.clone());
        Ok(train)
    }

    async fn list_trains(&self) -> StoreResult<Vec<Train>> {
        Ok(self.lock().await?.trains.values().cloned().collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.lock().await?;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            staged,
        }))
    }

    async fn seat_availability(&self, key: &LedgerKey) -> StoreResult<Option<SeatAvailability>> {
        Ok(self.lock().await?.seats.get(key).cloned())
    }

    async fn find_booking(&self, pnr: &str) -> StoreResult<Option<Booking>> {
        Ok(self.lock().await?.bookings.get(pnr).cloned())
    }

    async fn daily_report(&self) -> StoreResult<Vec<DailyBookingSummary>> {
        let tables = self.lock().await?;
        let mut days: BTreeMap<chrono::NaiveDate, (u64, Decimal)> = BTreeMap::new();
        for booking in tables.bookings.values() {
            let entry = days
                .entry(booking.created_at.date_naive())
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += booking.total_fare;
        }

        Ok(days
            .into_iter()
            .map(|(date, (bookings, revenue))| DailyBookingSummary {
                date,
                bookings,
                revenue,
            })
            .collect())
    }
}

pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<Tables>>,
    staged: Tables,
}

impl MemoryUnitOfWork {
    fn tables(&mut self) -> StoreResult<&mut Tables> {
        if self.guard.is_none() {
            return Err(StoreError::Backend("unit of work already finished".to_string()));
        }
        Ok(&mut self.staged)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn train(&mut self, train_id: i64) -> StoreResult<Option<Train>> {
        Ok(self.tables()?.trains.get(&train_id).cloned())
    }

    async fn seat_availability(
        &mut self,
        key: &LedgerKey,
    ) -> StoreResult<Option<SeatAvailability>> {
        Ok(self.tables()?.seats.get(key).cloned())
    }

    async fn seed_seats(&mut self, key: &LedgerKey, seats_total: u32) -> StoreResult<()> {
        self.tables()?.seed(key, seats_total);
        Ok(())
    }

    async fn debit_seats(&mut self, key: &LedgerKey, count: u32) -> StoreResult<SeatDebit> {
        Ok(self.tables()?.debit(key, count))
    }

    async fn credit_seats(
        &mut self,
        key: &LedgerKey,
        count: u32,
    ) -> StoreResult<Option<SeatAvailability>> {
        self.tables()?.credit(key, count)
    }

    async fn pnr_exists(&mut self, pnr: &str) -> StoreResult<bool> {
        Ok(self.tables()?.bookings.contains_key(pnr))
    }

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        let tables = self.tables()?;
        if !tables.trains.contains_key(&booking.train_id) {
            return Err(StoreError::Constraint(format!(
                "train {} does not exist",
                booking.train_id
            )));
        }
        if tables.bookings.contains_key(&booking.pnr) {
            return Err(StoreError::Constraint(format!("pnr {} already exists", booking.pnr)));
        }
        tables.bookings.insert(booking.pnr.clone(), booking.clone());
        Ok(())
    }

    async fn booking_for_update(&mut self, pnr: &str) -> StoreResult<Option<Booking>> {
        Ok(self.tables()?.bookings.get(pnr).cloned())
    }

    async fn save_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        match self.tables()?.bookings.get_mut(&booking.pnr) {
            Some(existing) => {
                existing.status = booking.status;
                existing.payment_status = booking.payment_status;
                existing.refund_amount = booking.refund_amount;
                existing.cancelled_at = booking.cancelled_at;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("booking {} vanished", booking.pnr))),
        }
    }

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        let tables = self.tables()?;
        if !tables.bookings.values().any(|b| b.id == payment.booking_id) {
            return Err(StoreError::Constraint(format!(
                "booking {} does not exist",
                payment.booking_id
            )));
        }
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self
            .tables()?
            .payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .min_by_key(|p| p.created_at)
            .cloned())
    }

    async fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentRecordStatus,
    ) -> StoreResult<()> {
        match self.tables()?.payments.get_mut(&payment_id) {
            Some(payment) => {
                payment.status = status;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("payment {} vanished", payment_id))),
        }
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| StoreError::Backend("unit of work already finished".to_string()))?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        self.guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn store() -> MemoryStore {
        MemoryStore::new(Duration::from_millis(200))
    }

    fn new_train(train_no: &str, source: &str, destination: &str) -> NewTrain {
        NewTrain {
            train_no: train_no.to_string(),
            name: format!("{} Express", source),
            source: source.to_string(),
            destination: destination.to_string(),
            route: String::new(),
            total_seats: 10,
            classes: BTreeMap::from([("AC".to_string(), 4)]),
            fares: BTreeMap::from([("AC".to_string(), dec!(100))]),
            schedule: serde_json::Value::Null,
        }
    }

    fn key(train_id: i64) -> LedgerKey {
        LedgerKey::new(train_id, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), "AC")
    }

    #[tokio::test]
    async fn test_catalog_assigns_ids_and_rejects_duplicates() {
        let store = store();
        let a = store.add_train(new_train("IR-001", "Delhi", "Mumbai")).await.unwrap();
        let b = store.add_train(new_train("IR-002", "Mumbai", "Goa")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let dup = store.add_train(new_train("IR-001", "X", "Y")).await.unwrap_err();
        assert!(matches!(dup, StoreError::Constraint(_)));

        let listed = store.list_trains().await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|t| t.train_no.as_str()).collect();
        assert_eq!(numbers, ["IR-001", "IR-002"]);
    }

    #[tokio::test]
    async fn test_uncommitted_work_is_discarded() {
        let store = store();
        let train = store.add_train(new_train("IR-001", "Delhi", "Mumbai")).await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            uow.seed_seats(&key(train.id), 4).await.unwrap();
            uow.debit_seats(&key(train.id), 1).await.unwrap();
            // dropped without commit
        }
        assert!(store.seat_availability(&key(train.id)).await.unwrap().is_none());

        let mut uow = store.begin().await.unwrap();
        uow.seed_seats(&key(train.id), 4).await.unwrap();
        uow.debit_seats(&key(train.id), 3).await.unwrap();
        uow.commit().await.unwrap();

        let row = store.seat_availability(&key(train.id)).await.unwrap().unwrap();
        assert_eq!((row.seats_left, row.seats_total), (1, 4));
    }

    #[tokio::test]
    async fn test_debit_guards_against_overselling() {
        let store = store();
        let train = store.add_train(new_train("IR-001", "Delhi", "Mumbai")).await.unwrap();
        let mut uow = store.begin().await.unwrap();

        assert_eq!(uow.debit_seats(&key(train.id), 1).await.unwrap(), SeatDebit::Missing);

        uow.seed_seats(&key(train.id), 2).await.unwrap();
        // seeding twice keeps the first row
        uow.seed_seats(&key(train.id), 50).await.unwrap();

        assert_eq!(
            uow.debit_seats(&key(train.id), 3).await.unwrap(),
            SeatDebit::Insufficient { available: 2 }
        );
        assert!(matches!(
            uow.debit_seats(&key(train.id), 2).await.unwrap(),
            SeatDebit::Debited(SeatAvailability { seats_left: 0, .. })
        ));
        assert!(uow.credit_seats(&key(99), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_held_lock_surfaces_as_contention() {
        let store = store();
        let _held = store.begin().await.unwrap();

        let err = store.begin().await.err().unwrap();
        assert!(matches!(err, StoreError::Contention(_)));
    }

    #[tokio::test]
    async fn test_finished_unit_of_work_rejects_use() {
        let store = store();
        let mut uow = store.begin().await.unwrap();
        uow.commit().await.unwrap();

        assert!(uow.pnr_exists("ABCDEFGHIJ").await.is_err());
        assert!(uow.commit().await.is_err());
        // lock released by commit
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_payment_status_update_fails() {
        let store = store();
        let mut uow = store.begin().await.unwrap();

        let err = uow
            .set_payment_status(Uuid::new_v4(), PaymentRecordStatus::Refunded)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
