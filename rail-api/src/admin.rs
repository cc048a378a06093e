use axum::{extract::State, middleware, routing::get, Extension, Json, Router};
use rail_core::DailyBookingSummary;

use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, Claims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/reports/daily", get(daily_report))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

/// Bookings and revenue per creation day, oldest first.
async fn daily_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DailyBookingSummary>>, AppError> {
    let report = state.bookings.daily_report(&claims.requester()).await?;
    Ok(Json(report))
}
