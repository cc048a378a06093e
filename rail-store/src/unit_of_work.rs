use async_trait::async_trait;
use rail_catalog::Train;
use rail_core::models::{Booking, LedgerKey, Payment, PaymentRecordStatus, SeatAvailability};
use rail_core::repository::{SeatDebit, UnitOfWork};
use rail_core::{StoreError, StoreResult};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::database::db_error;
use crate::{booking_repo, catalog_repo, ledger_repo};

/// A Postgres transaction. Dropping it unfinished rolls back.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    pub async fn begin(pool: &PgPool, lock_timeout: Duration) -> StoreResult<Self> {
        let mut tx = pool.begin().await.map_err(db_error)?;

        // Waiting on a locked seat row longer than this surfaces as 55P03.
        // SET does not take bind parameters; the value is an integer.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        Ok(Self { tx: Some(tx) })
    }

    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| StoreError::Backend("unit of work already finished".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn train(&mut self, train_id: i64) -> StoreResult<Option<Train>> {
        catalog_repo::fetch_train(self.conn()?, train_id).await
    }

    async fn seat_availability(
        &mut self,
        key: &LedgerKey,
    ) -> StoreResult<Option<SeatAvailability>> {
        ledger_repo::fetch(self.conn()?, key).await
    }

    async fn seed_seats(&mut self, key: &LedgerKey, seats_total: u32) -> StoreResult<()> {
        ledger_repo::seed(self.conn()?, key, seats_total).await
    }

    async fn debit_seats(&mut self, key: &LedgerKey, count: u32) -> StoreResult<SeatDebit> {
        ledger_repo::debit(self.conn()?, key, count).await
    }

    async fn credit_seats(
        &mut self,
        key: &LedgerKey,
        count: u32,
    ) -> StoreResult<Option<SeatAvailability>> {
        ledger_repo::credit(self.conn()?, key, count).await
    }

    async fn pnr_exists(&mut self, pnr: &str) -> StoreResult<bool> {
        booking_repo::pnr_exists(self.conn()?, pnr).await
    }

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        booking_repo::insert_booking(self.conn()?, booking).await
    }

    async fn booking_for_update(&mut self, pnr: &str) -> StoreResult<Option<Booking>> {
        booking_repo::fetch_booking(self.conn()?, pnr, true).await
    }

    async fn save_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        booking_repo::update_booking(self.conn()?, booking).await
    }

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        booking_repo::insert_payment(self.conn()?, payment).await
    }

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> StoreResult<Option<Payment>> {
        booking_repo::payment_for_booking(self.conn()?, booking_id).await
    }

    async fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentRecordStatus,
    ) -> StoreResult<()> {
        booking_repo::set_payment_status(self.conn()?, payment_id, status).await
    }

    async fn commit(&mut self) -> StoreResult<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await.map_err(db_error),
            None => Err(StoreError::Backend("unit of work already finished".to_string())),
        }
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(db_error),
            None => Ok(()),
        }
    }
}
