use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rail_core::models::LedgerKey;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub train_id: i64,
    pub date: NaiveDate,
    pub class: String,
    /// `null` until the first booking seeds the ledger for this key
    pub seats_left: Option<u32>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/trains/{train_id}/availability", get(get_availability))
}

async fn get_availability(
    State(state): State<AppState>,
    Path(train_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = query
        .date
        .ok_or_else(|| AppError::ValidationError("date is required".to_string()))?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("invalid date: {}", date)))?;
    let class = query
        .class
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("class is required".to_string()))?;

    let key = LedgerKey::new(train_id, date, class);
    let seats_left = state.bookings.availability(&key).await?;

    Ok(Json(AvailabilityResponse {
        train_id,
        date,
        class: key.class,
        seats_left,
    }))
}
