use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{BookingError, BookingResult},
    middleware::AuthUser,
    models::{Booking, BookingDetails},
    services::reservation::ReservationRequest,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_my_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub show_id: i64,
    #[validate(length(min = 1, message = "must contain at least one seat"))]
    pub seat_codes: Vec<String>,
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub payment_method: String,
    #[serde(default)]
    pub has_parking: bool,
    pub vehicle_type: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> BookingResult<impl IntoResponse> {
    req.validate()?;

    let reservation = state
        .reservations
        .reserve(ReservationRequest {
            show_id: req.show_id,
            user_id: user.user_id,
            seat_codes: req.seat_codes,
            payment_method: req.payment_method,
            has_parking: req.has_parking,
            vehicle_type: req.vehicle_type,
        })
        .await?;

    state.invalidate_show(reservation.booking.booking.show_id).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created, complete payment to confirm",
            "booking": reservation.booking,
            "seats": reservation.seats,
            "subtotal": reservation.subtotal,
            "seat_subtotal": reservation.seat_subtotal,
            "parking_fee": reservation.parking_fee,
        })),
    ))
}

// GET /api/bookings
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> BookingResult<impl IntoResponse> {
    let bookings = Booking::list_for_user(user.user_id, &state.db.pool).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> BookingResult<impl IntoResponse> {
    let mut conn = state.db.pool.acquire().await?;

    let booking = Booking::find_by_id(id, &mut *conn)
        .await?
        .ok_or(BookingError::NotFound("Booking"))?;

    if booking.user_id != user.user_id && !user.is_admin() {
        return Err(BookingError::Forbidden("Not allowed to view this booking".to_string()));
    }

    let details = BookingDetails::load(&mut *conn, booking).await?;
    Ok(Json(details))
}
