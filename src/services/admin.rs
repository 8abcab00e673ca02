//! admin.rs
//!
//! Административные операции над бронями: ручная смена статуса с пересчетом
//! счетчика `shows.seats_booked` и удаление брони по правилам отмены.

use tracing::{info, warn};

use crate::database::Database;
use crate::error::{is_active_seat_violation, BookingError, BookingResult};
use crate::models::{Booking, BookingDetails, BookingStatus, Payment};

/// Статус хранится в VARCHAR(20).
const MAX_STATUS_LEN: usize = 20;

/// Как смена статуса влияет на счетчик подтвержденных мест.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAdjustment {
    Increment,
    Decrement,
    Unchanged,
}

impl CounterAdjustment {
    pub fn for_transition(previous: &BookingStatus, next: &BookingStatus) -> Self {
        let was_confirmed = *previous == BookingStatus::Confirmed;
        let is_confirmed = *next == BookingStatus::Confirmed;
        match (was_confirmed, is_confirmed) {
            (false, true) => CounterAdjustment::Increment,
            (true, false) => CounterAdjustment::Decrement,
            _ => CounterAdjustment::Unchanged,
        }
    }
}

#[derive(Clone)]
pub struct AdminBookingService {
    db: Database,
}

impl AdminBookingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Выставляет брони произвольный статус.
    ///
    /// Переход в `confirmed` увеличивает счетчик сеанса, выход из `confirmed`
    /// уменьшает (но не ниже нуля). Активность мест брони следует за статусом.
    pub async fn update_status(&self, booking_id: i64, raw_status: &str) -> BookingResult<BookingDetails> {
        let next = parse_target_status(raw_status)?;

        let mut tx = self.db.pool.begin().await?;

        let booking = Booking::find_for_update(booking_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;
        let previous = booking.status();

        sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next.as_str())
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

        // Места держит только активная бронь. При возврате в активный статус
        // место могло уйти другой брони - тогда сработает уникальный индекс.
        if previous.is_active() != next.is_active() {
            sqlx::query("UPDATE booking_seats SET is_active = $1 WHERE booking_id = $2")
                .bind(next.is_active())
                .bind(booking.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_active_seat_violation(&e) {
                        BookingError::Conflict(format!(
                            "Seats of booking {} are already held by another active booking",
                            booking.id
                        ))
                    } else {
                        BookingError::Internal(e)
                    }
                })?;
        }

        match CounterAdjustment::for_transition(&previous, &next) {
            CounterAdjustment::Increment => {
                sqlx::query(
                    "UPDATE shows SET seats_booked = seats_booked + $1, updated_at = NOW() WHERE id = $2"
                )
                .bind(booking.seats_count)
                .bind(booking.show_id)
                .execute(&mut *tx)
                .await?;
            }
            CounterAdjustment::Decrement => {
                let updated = sqlx::query(
                    "UPDATE shows SET seats_booked = seats_booked - $1, updated_at = NOW()
                     WHERE id = $2 AND seats_booked >= $1"
                )
                .bind(booking.seats_count)
                .bind(booking.show_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if updated == 0 {
                    warn!(
                        "seats_booked of show {} is below {}, decrement for booking {} skipped",
                        booking.show_id, booking.seats_count, booking.id
                    );
                }
            }
            CounterAdjustment::Unchanged => {}
        }

        let updated = Booking::find_by_id(booking.id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;
        let details = BookingDetails::load(&mut *tx, updated).await?;

        tx.commit().await?;

        info!(
            "Booking {} status changed by admin: {} -> {}",
            booking_id, previous, next
        );
        Ok(details)
    }

    /// Удаляет бронь вместе с местами. Подтвержденные и оплаченные брони удалять нельзя.
    pub async fn delete_booking(&self, booking_id: i64) -> BookingResult<()> {
        let mut tx = self.db.pool.begin().await?;

        let booking = Booking::find_for_update(booking_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;
        let payment = Payment::find_by_booking(booking.id, &mut *tx).await?;

        ensure_deletable(&booking, payment.as_ref())?;

        sqlx::query("DELETE FROM booking_seats WHERE booking_id = $1")
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM payments WHERE booking_id = $1")
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Booking {} deleted ({} seats released)", booking.id, booking.seats_count);
        Ok(())
    }

    pub async fn list_bookings(&self, status: Option<&str>) -> BookingResult<Vec<Booking>> {
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| BookingStatus::parse(s).as_str().to_string());
        Ok(Booking::list_all(status.as_deref(), &self.db.pool).await?)
    }
}

fn parse_target_status(raw: &str) -> BookingResult<BookingStatus> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation("Status must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_STATUS_LEN {
        return Err(BookingError::Validation(format!(
            "Status must be at most {MAX_STATUS_LEN} characters"
        )));
    }
    Ok(BookingStatus::parse(trimmed))
}

/// Правило отмены: подтвержденную или оплаченную бронь молча удалять нельзя.
pub fn ensure_deletable(booking: &Booking, payment: Option<&Payment>) -> BookingResult<()> {
    let paid = payment.map(Payment::is_completed).unwrap_or(false);
    if booking.status() == BookingStatus::Confirmed || paid {
        return Err(BookingError::Forbidden(
            "Cannot delete a confirmed or paid booking".to_string(),
        ));
    }
    Ok(())
}
