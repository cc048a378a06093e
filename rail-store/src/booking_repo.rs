use chrono::{DateTime, NaiveDate, Utc};
use rail_core::models::{
    Booking, DailyBookingSummary, Payment, PaymentRecordStatus,
};
use rail_core::{StoreError, StoreResult};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::{db_error, to_i32, to_u32};

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    pnr: String,
    user_id: String,
    train_id: i64,
    travel_date: NaiveDate,
    seat_class: String,
    seat_count: i32,
    fare_per_seat: Decimal,
    total_fare: Decimal,
    status: String,
    payment_status: String,
    refund_amount: Option<Decimal>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    fn into_booking(self) -> StoreResult<Booking> {
        Ok(Booking {
            id: self.id,
            pnr: self.pnr,
            user_id: self.user_id,
            train_id: self.train_id,
            travel_date: self.travel_date,
            class: self.seat_class,
            seat_count: to_u32(self.seat_count)?,
            fare_per_seat: self.fare_per_seat,
            total_fare: self.total_fare,
            status: self.status.parse().map_err(StoreError::Backend)?,
            payment_status: self.payment_status.parse().map_err(StoreError::Backend)?,
            refund_amount: self.refund_amount,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    provider: String,
    provider_payment_id: String,
    amount: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> StoreResult<Payment> {
        Ok(Payment {
            id: self.id,
            booking_id: self.booking_id,
            provider: self.provider,
            provider_payment_id: self.provider_payment_id,
            amount: self.amount,
            currency: self.currency,
            status: self.status.parse().map_err(StoreError::Backend)?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DailyRow {
    day: NaiveDate,
    bookings: i64,
    revenue: Decimal,
}

const BOOKING_COLUMNS: &str = "id, pnr, user_id, train_id, travel_date, seat_class, seat_count, \
    fare_per_seat, total_fare, status, payment_status, refund_amount, created_at, cancelled_at";

pub async fn pnr_exists(conn: &mut PgConnection, pnr: &str) -> StoreResult<bool> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM bookings WHERE pnr = $1)")
        .bind(pnr)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error)?;
    Ok(exists)
}

pub async fn insert_booking(conn: &mut PgConnection, booking: &Booking) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (id, pnr, user_id, train_id, travel_date, seat_class, seat_count,
                              fare_per_seat, total_fare, status, payment_status, refund_amount,
                              created_at, cancelled_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(booking.id)
    .bind(&booking.pnr)
    .bind(&booking.user_id)
    .bind(booking.train_id)
    .bind(booking.travel_date)
    .bind(&booking.class)
    .bind(to_i32(booking.seat_count)?)
    .bind(booking.fare_per_seat)
    .bind(booking.total_fare)
    .bind(booking.status.as_str())
    .bind(booking.payment_status.as_str())
    .bind(booking.refund_amount)
    .bind(booking.created_at)
    .bind(booking.cancelled_at)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    Ok(())
}

/// `lock` adds `FOR UPDATE` so concurrent cancellations of one PNR serialize.
pub async fn fetch_booking(
    conn: &mut PgConnection,
    pnr: &str,
    lock: bool,
) -> StoreResult<Option<Booking>> {
    let sql = format!(
        "SELECT {} FROM bookings WHERE pnr = $1{}",
        BOOKING_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );

    let row: Option<BookingRow> = sqlx::query_as(&sql)
        .bind(pnr)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;

    row.map(BookingRow::into_booking).transpose()
}

pub async fn update_booking(conn: &mut PgConnection, booking: &Booking) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, payment_status = $3, refund_amount = $4, cancelled_at = $5
        WHERE id = $1
        "#,
    )
    .bind(booking.id)
    .bind(booking.status.as_str())
    .bind(booking.payment_status.as_str())
    .bind(booking.refund_amount)
    .bind(booking.cancelled_at)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Backend(format!("booking {} vanished", booking.pnr)));
    }
    Ok(())
}

pub async fn insert_payment(conn: &mut PgConnection, payment: &Payment) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, booking_id, provider, provider_payment_id, amount, currency, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(payment.id)
    .bind(payment.booking_id)
    .bind(&payment.provider)
    .bind(&payment.provider_payment_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status.as_str())
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    Ok(())
}

pub async fn payment_for_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> StoreResult<Option<Payment>> {
    let row: Option<PaymentRow> = sqlx::query_as(
        r#"
        SELECT id, booking_id, provider, provider_payment_id, amount, currency, status, created_at
        FROM payments WHERE booking_id = $1
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    row.map(PaymentRow::into_payment).transpose()
}

pub async fn set_payment_status(
    conn: &mut PgConnection,
    payment_id: Uuid,
    status: PaymentRecordStatus,
) -> StoreResult<()> {
    let result = sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
        .bind(payment_id)
        .bind(status.as_str())
        .execute(&mut *conn)
        .await
        .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Backend(format!("payment {} vanished", payment_id)));
    }
    Ok(())
}

pub async fn daily_report(conn: &mut PgConnection) -> StoreResult<Vec<DailyBookingSummary>> {
    let rows: Vec<DailyRow> = sqlx::query_as(
        r#"
        SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
               COUNT(*) AS bookings,
               COALESCE(SUM(total_fare), 0) AS revenue
        FROM bookings
        GROUP BY day
        ORDER BY day
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| DailyBookingSummary {
            date: row.day,
            bookings: row.bookings.max(0) as u64,
            revenue: row.revenue,
        })
        .collect())
}
