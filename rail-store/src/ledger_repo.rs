//! Seat ledger queries. Each statement is a single atomic row operation;
//! the surrounding transaction supplies the unit-of-work boundary.

use chrono::{DateTime, NaiveDate, Utc};
use rail_core::models::{LedgerKey, SeatAvailability};
use rail_core::repository::SeatDebit;
use rail_core::StoreResult;
use sqlx::PgConnection;

use crate::database::{db_error, to_i32, to_u32};

#[derive(sqlx::FromRow)]
struct SeatRow {
    train_id: i64,
    travel_date: NaiveDate,
    seat_class: String,
    seats_left: i32,
    seats_total: i32,
    updated_at: DateTime<Utc>,
}

impl SeatRow {
    fn into_availability(self) -> StoreResult<SeatAvailability> {
        Ok(SeatAvailability {
            key: LedgerKey::new(self.train_id, self.travel_date, self.seat_class),
            seats_left: to_u32(self.seats_left)?,
            seats_total: to_u32(self.seats_total)?,
            updated_at: self.updated_at,
        })
    }
}

const SEAT_COLUMNS: &str = "train_id, travel_date, seat_class, seats_left, seats_total, updated_at";

pub async fn fetch(
    conn: &mut PgConnection,
    key: &LedgerKey,
) -> StoreResult<Option<SeatAvailability>> {
    let row: Option<SeatRow> = sqlx::query_as(&format!(
        "SELECT {} FROM seat_availability WHERE train_id = $1 AND travel_date = $2 AND seat_class = $3",
        SEAT_COLUMNS
    ))
    .bind(key.train_id)
    .bind(key.travel_date)
    .bind(&key.class)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    row.map(SeatRow::into_availability).transpose()
}

pub async fn seed(conn: &mut PgConnection, key: &LedgerKey, seats_total: u32) -> StoreResult<()> {
    let seats_total = to_i32(seats_total)?;
    sqlx::query(
        r#"
        INSERT INTO seat_availability (train_id, travel_date, seat_class, seats_left, seats_total)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (train_id, travel_date, seat_class) DO NOTHING
        "#,
    )
    .bind(key.train_id)
    .bind(key.travel_date)
    .bind(&key.class)
    .bind(seats_total)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    Ok(())
}

pub async fn debit(conn: &mut PgConnection, key: &LedgerKey, count: u32) -> StoreResult<SeatDebit> {
    // Check and decrement in one statement; the row lock is held until the
    // transaction ends, so a competing debit waits and re-evaluates the guard.
    let row: Option<SeatRow> = sqlx::query_as(&format!(
        r#"
        UPDATE seat_availability
        SET seats_left = seats_left - $4, updated_at = NOW()
        WHERE train_id = $1 AND travel_date = $2 AND seat_class = $3 AND seats_left >= $4
        RETURNING {}
        "#,
        SEAT_COLUMNS
    ))
    .bind(key.train_id)
    .bind(key.travel_date)
    .bind(&key.class)
    .bind(to_i32(count)?)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    match row {
        Some(row) => Ok(SeatDebit::Debited(row.into_availability()?)),
        None => match fetch(conn, key).await? {
            Some(current) => Ok(SeatDebit::Insufficient {
                available: current.seats_left,
            }),
            None => Ok(SeatDebit::Missing),
        },
    }
}

pub async fn credit(
    conn: &mut PgConnection,
    key: &LedgerKey,
    count: u32,
) -> StoreResult<Option<SeatAvailability>> {
    let row: Option<SeatRow> = sqlx::query_as(&format!(
        r#"
        UPDATE seat_availability
        SET seats_left = seats_left + $4, updated_at = NOW()
        WHERE train_id = $1 AND travel_date = $2 AND seat_class = $3
        RETURNING {}
        "#,
        SEAT_COLUMNS
    ))
    .bind(key.train_id)
    .bind(key.travel_date)
    .bind(&key.class)
    .bind(to_i32(count)?)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    row.map(SeatRow::into_availability).transpose()
}
