use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::BookingResult,
    middleware::AuthUser,
    models::Payment,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments/initiate", post(initiate_payment))
        .route("/payments/mock/confirm/{id}", post(confirm_payment))
        .route("/payments/user", get(list_user_payments))
}

// --- Request структуры ---
#[derive(Debug, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub booking_id: i64,
    #[validate(length(max = 50))]
    pub method: Option<String>,
}

// --- HTTP Handlers ---

/// POST /api/payments/initiate
pub async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<InitiatePaymentRequest>,
) -> BookingResult<impl IntoResponse> {
    req.validate()?;

    let payment = state
        .payments
        .initiate(req.booking_id, user.user_id, req.method.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Payment initiated",
        "payment_id": payment.id,
        "mock_redirect": format!("/api/payments/mock/confirm/{}", payment.id),
    })))
}

/// POST /api/payments/mock/confirm/{id}
///
/// Имитирует возврат пользователя со страницы оплаты провайдера.
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(payment_id): Path<i64>,
) -> BookingResult<impl IntoResponse> {
    let confirmation = state.payments.confirm(payment_id).await?;

    if !confirmation.already_confirmed {
        if let Some(show_id) = booking_show_id(&state, confirmation.booking_id).await? {
            state.invalidate_show(show_id).await;
        }
    }

    let message = if confirmation.already_confirmed {
        "Booking already confirmed"
    } else {
        "Payment successful, booking confirmed"
    };

    Ok(Json(json!({
        "message": message,
        "booking": confirmation.booking_id,
        "status": confirmation.status,
        "amount": confirmation.amount,
        "method": confirmation.method,
        "datetime": confirmation.datetime,
    })))
}

/// GET /api/payments/user
pub async fn list_user_payments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> BookingResult<impl IntoResponse> {
    let payments = Payment::list_for_user(user.user_id, &state.db.pool).await?;
    Ok(Json(payments))
}

async fn booking_show_id(state: &AppState, booking_id: i64) -> BookingResult<Option<i64>> {
    let show_id = sqlx::query_scalar::<_, i64>("SELECT show_id FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_optional(&state.db.pool)
        .await?;
    Ok(show_id)
}
