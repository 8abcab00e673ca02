use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    error::{BookingError, BookingResult},
    middleware::AdminUser,
    models::Booking,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/bookings/{id}/status", put(update_status))
        .route("/admin/bookings/{id}", delete(delete_booking))
}

#[derive(Debug, Deserialize)]
pub struct BookingFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 20, message = "must be 1..20 characters"))]
    pub status: String,
}

// GET /api/admin/bookings?status=
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(filter): Query<BookingFilter>,
) -> BookingResult<impl IntoResponse> {
    let bookings = state.admin.list_bookings(filter.status.as_deref()).await?;
    Ok(Json(json!({ "bookings": bookings })))
}

// PUT /api/admin/bookings/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> BookingResult<impl IntoResponse> {
    req.validate()?;

    let details = state.admin.update_status(id, &req.status).await?;
    state.invalidate_show(details.booking.show_id).await;

    info!("admin {} set booking {} to {}", admin.user_id, id, details.booking.status);
    Ok(Json(json!({
        "message": "Booking status updated",
        "booking": details,
    })))
}

// DELETE /api/admin/bookings/{id}
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> BookingResult<impl IntoResponse> {
    let booking = Booking::find_by_id(id, &state.db.pool)
        .await?
        .ok_or(BookingError::NotFound("Booking"))?;

    state.admin.delete_booking(booking.id).await?;
    state.invalidate_show(booking.show_id).await;

    info!("admin {} deleted booking {}", admin.user_id, id);
    Ok(Json(json!({ "message": "Booking deleted" })))
}
