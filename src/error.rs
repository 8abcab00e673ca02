//! error.rs
//!
//! Единая таксономия ошибок ядра бронирования и ее отображение в HTTP-ответы.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type BookingResult<T> = Result<T, BookingError>;

/// Имя уникального индекса, который не дает двум активным броням взять одно место.
const ACTIVE_SEAT_INDEX: &str = "uq_booking_seats_active_seat";

#[derive(Debug, Error)]
pub enum BookingError {
    /// Некорректный код места, тип транспорта, дубликаты и т.п.
    #[error("{0}")]
    Validation(String),

    /// Место уже занято или парковка заполнена. Можно повторить с другими местами.
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    /// Операция над бронью в неожиданном статусе.
    #[error("{0}")]
    State(String),

    #[error("database error: {0}")]
    Internal(#[from] sqlx::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::State(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Переводит нарушение уникальности активного места в `Conflict`.
    /// Остальные ошибки БД остаются `Internal`.
    pub fn from_seat_insert(err: sqlx::Error, seat_code: &str) -> Self {
        if is_active_seat_violation(&err) {
            BookingError::Conflict(format!("Seat {seat_code} already booked by another active booking."))
        } else {
            BookingError::Internal(err)
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {reason}")
            })
            .collect();
        fields.sort();
        BookingError::Validation(fields.join("; "))
    }
}

pub fn is_active_seat_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(ACTIVE_SEAT_INDEX)
        }
        _ => false,
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BookingError::Internal(e) => {
                tracing::error!("booking operation failed: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
