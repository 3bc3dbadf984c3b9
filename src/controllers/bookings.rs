use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{booking_id}/confirm", post(confirm_booking))
        .route("/bookings/{booking_id}/cancel", post(cancel_booking))
}

/* ---------- requests ---------- */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    #[validate(range(min = 1, message = "showId must be > 0"))]
    show_id: i64,
    // The per-booking cap applies to distinct seats and is enforced by the service
    #[validate(length(min = 1, message = "seatIds must not be empty"))]
    seat_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ConfirmBookingRequest {
    #[validate(length(min = 1, max = 128))]
    payment_reference: Option<String>,
}

fn validate<T: Validate>(req: &T) -> AppResult<()> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/* ---------- handlers ---------- */

// GET /api/bookings
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let bookings = state.bookings.list_for_user(user.user_id).await?;
    Ok(Json(json!({ "data": bookings })))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&req)?;

    let booking = state
        .bookings
        .create_hold(user.user_id, req.show_id, &req.seat_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "data": booking }))))
}

// POST /api/bookings/{booking_id}/confirm
async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
    body: Option<Json<ConfirmBookingRequest>>,
) -> AppResult<impl IntoResponse> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    validate(&req)?;

    let booking = state
        .bookings
        .confirm(user.user_id, booking_id, req.payment_reference)
        .await?;

    Ok(Json(json!({ "data": booking })))
}

// POST /api/bookings/{booking_id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let booking = state.bookings.cancel(user.user_id, booking_id).await?;
    Ok(Json(json!({ "data": booking })))
}
