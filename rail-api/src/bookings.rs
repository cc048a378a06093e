use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rail_booking::{Cancellation, NewBooking};
use rail_core::pnr::is_valid_pnr;
use rail_core::Booking;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub pnr: String,
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
    pub seat_count: u32,
    pub fare_per_seat: Decimal,
    pub total_fare: Decimal,
    pub status: String,
    pub payment_status: String,
    pub refund_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            status: b.status.to_string(),
            payment_status: b.payment_status.to_string(),
            pnr: b.pnr,
            train_id: b.train_id,
            travel_date: b.travel_date,
            class: b.class,
            seat_count: b.seat_count,
            fare_per_seat: b.fare_per_seat,
            total_fare: b.total_fare,
            refund_amount: b.refund_amount,
            created_at: b.created_at,
            cancelled_at: b.cancelled_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub pnr: String,
    pub status: String,
    pub refund_amount: Decimal,
    /// Whole percent, e.g. 90
    pub refund_percentage: u32,
    pub days_before: i64,
}

impl From<Cancellation> for CancellationResponse {
    fn from(c: Cancellation) -> Self {
        Self {
            pnr: c.booking.pnr,
            status: c.booking.status.to_string(),
            refund_amount: c.refund.amount,
            refund_percentage: (c.refund.percentage * Decimal::ONE_HUNDRED)
                .to_u32()
                .unwrap_or_default(),
            days_before: c.refund.days_before,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{pnr}", get(get_booking))
        .route("/v1/bookings/{pnr}/cancel", post(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

fn check_pnr(pnr: &str) -> Result<(), AppError> {
    if is_valid_pnr(pnr) {
        Ok(())
    } else {
        Err(AppError::NotFoundError(format!("Not found: booking {}", pnr)))
    }
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let booking = state.bookings.create(req, &claims.requester()).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pnr): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_pnr(&pnr)?;
    let booking = state.bookings.get(&pnr, &claims.requester()).await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pnr): Path<String>,
) -> Result<Json<CancellationResponse>, AppError> {
    check_pnr(&pnr)?;
    let cancellation = state.bookings.cancel(&pnr, &claims.requester()).await?;
    Ok(Json(cancellation.into()))
}
