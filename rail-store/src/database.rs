use async_trait::async_trait;
use rail_core::models::{Booking, DailyBookingSummary, LedgerKey, SeatAvailability};
use rail_core::repository::{BookingStore, UnitOfWork};
use rail_core::{StoreError, StoreResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::unit_of_work::PgUnitOfWork;
use crate::{booking_repo, ledger_repo};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps driver errors onto the store taxonomy.
///
/// Lock timeouts, serialization failures and deadlocks become `Contention`
/// so callers can report them as retryable.
pub(crate) fn db_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut => StoreError::Contention(err.to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("40001") | Some("40P01") | Some("55P03") => {
                StoreError::Contention(db.message().to_string())
            }
            Some("23505") | Some("23503") | Some("23514") => {
                StoreError::Constraint(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        },
        _ => StoreError::Backend(err.to_string()),
    }
}

pub(crate) fn to_i32(value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Backend(format!("value {} out of range", value)))
}

pub(crate) fn to_u32(value: i32) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Backend(format!("negative count {} in store", value)))
}

/// Postgres-backed [`BookingStore`].
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: Pool<Postgres>,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(db: &DbClient, lock_timeout: Duration) -> Self {
        Self {
            pool: db.pool.clone(),
            lock_timeout,
        }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let uow = PgUnitOfWork::begin(&self.pool, self.lock_timeout).await?;
        Ok(Box::new(uow))
    }

    async fn seat_availability(&self, key: &LedgerKey) -> StoreResult<Option<SeatAvailability>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        ledger_repo::fetch(&mut conn, key).await
    }

    async fn find_booking(&self, pnr: &str) -> StoreResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        booking_repo::fetch_booking(&mut conn, pnr, false).await
    }

    async fn daily_report(&self) -> StoreResult<Vec<DailyBookingSummary>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        booking_repo::daily_report(&mut conn).await
    }
}
