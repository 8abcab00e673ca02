//! payment.rs
//!
//! Сервисный слой платежей. Настоящего платежного шлюза нет: подтверждение
//! платежа - это смена статусов в БД, как если бы пришел вебхук от провайдера.
//!
//! Ключевые моменты:
//! 1.  **Инициация**: один платеж на бронь. Повторный запрос возвращает уже
//!     созданный платеж.
//! 2.  **Подтверждение**: переводит бронь `pending -> confirmed` ровно один раз.
//!     Повторная доставка того же подтверждения ничего не меняет.
//! 3.  Платеж, бронь и счетчик `shows.seats_booked` меняются в одной транзакции.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    payment::PAYMENT_COLUMNS, Booking, BookingStatus, Payment, PaymentStatus,
};

/// Результат подтверждения платежа.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentConfirmation {
    pub booking_id: i64,
    pub status: String,
    pub amount: f64,
    pub method: String,
    pub datetime: DateTime<Utc>,
    /// `true`, если бронь уже была подтверждена и вызов ничего не изменил
    pub already_confirmed: bool,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Database,
}

impl PaymentService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Создает платеж для брони пользователя в статусе `initiated`.
    pub async fn initiate(
        &self,
        booking_id: i64,
        user_id: i64,
        method: Option<&str>,
    ) -> BookingResult<Payment> {
        let mut tx = self.db.pool.begin().await?;

        let booking = Booking::find_for_update(booking_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;

        if booking.user_id != user_id {
            return Err(BookingError::Forbidden(
                "Booking does not belong to the current user".to_string(),
            ));
        }

        // Повторная инициация возвращает уже существующий платеж
        if let Some(existing) = Payment::find_by_booking(booking.id, &mut *tx).await? {
            tx.commit().await?;
            info!("Payment {} already exists for booking {}", existing.id, booking.id);
            return Ok(existing);
        }

        let status = booking.status();
        if status != BookingStatus::Pending {
            return Err(BookingError::State(format!(
                "Booking {} is {}, payment can only be initiated for pending bookings",
                booking.id, status
            )));
        }

        let method = method
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(booking.payment_method.as_str());

        let insert = format!(
            "INSERT INTO payments (booking_id, method, provider_tx, amount, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&insert)
            .bind(booking.id)
            .bind(method)
            .bind(mock_provider_reference())
            .bind(booking.total_amount)
            .bind(PaymentStatus::Initiated.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Payment {} initiated for booking {}: amount={:.2}, method={}",
            payment.id, booking.id, payment.amount, payment.method
        );
        Ok(payment)
    }

    /// Подтверждает платеж. Идемпотентно: если бронь уже `confirmed`,
    /// возвращает текущее состояние без изменений.
    pub async fn confirm(&self, payment_id: i64) -> BookingResult<PaymentConfirmation> {
        let mut tx = self.db.pool.begin().await?;

        // Порядок блокировок как у остальных потоков: сначала бронь, потом платеж.
        // Дубликаты подтверждения ждут на брони, и второй увидит ее уже подтвержденной.
        let booking_id = Payment::find_by_id(payment_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Payment"))?
            .booking_id;

        let booking = Booking::find_for_update(booking_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;

        // Пока ждали бронь, платеж могли удалить вместе с ней
        let payment = Payment::find_for_update(payment_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Payment"))?;

        match booking.status() {
            BookingStatus::Confirmed => {
                tx.commit().await?;
                info!(
                    "Payment {} confirmation repeated, booking {} already confirmed",
                    payment.id, booking.id
                );
                Ok(PaymentConfirmation {
                    booking_id: booking.id,
                    status: booking.status,
                    amount: payment.amount,
                    method: payment.method,
                    datetime: payment.updated_at,
                    already_confirmed: true,
                })
            }
            BookingStatus::Pending => {
                let confirmed_at: DateTime<Utc> = sqlx::query_scalar(
                    "UPDATE payments SET status = $1, updated_at = NOW() WHERE id = $2
                     RETURNING updated_at"
                )
                .bind(PaymentStatus::Completed.as_str())
                .bind(payment.id)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
                    .bind(BookingStatus::Confirmed.as_str())
                    .bind(booking.id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    "UPDATE shows SET seats_booked = seats_booked + $1, updated_at = NOW() WHERE id = $2"
                )
                .bind(booking.seats_count)
                .bind(booking.show_id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                info!(
                    "Payment {} completed, booking {} confirmed, {} seats sold for show {}",
                    payment.id, booking.id, booking.seats_count, booking.show_id
                );
                Ok(PaymentConfirmation {
                    booking_id: booking.id,
                    status: BookingStatus::Confirmed.as_str().to_string(),
                    amount: payment.amount,
                    method: payment.method,
                    datetime: confirmed_at,
                    already_confirmed: false,
                })
            }
            other => {
                warn!(
                    "Payment {} cannot be confirmed: booking {} is {}",
                    payment.id, booking.id, other
                );
                Err(BookingError::State(format!(
                    "Booking {} is {}, payment cannot be confirmed",
                    booking.id, other
                )))
            }
        }
    }
}

/// Идентификатор "транзакции у провайдера" для мок-платежа.
fn mock_provider_reference() -> String {
    format!("PAY-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_references_are_unique() {
        let a = mock_provider_reference();
        let b = mock_provider_reference();
        assert!(a.starts_with("PAY-"));
        assert_ne!(a, b);
    }
}
