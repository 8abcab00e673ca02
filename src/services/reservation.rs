//! reservation.rs
//!
//! Создание брони: проверка кодов мест, парковки и занятости, вставка брони
//! и ее мест. Все шаги выполняются в одной транзакции.
//!
//! Гонка "проверили - вставили" закрыта двумя слоями:
//! 1.  `SELECT ... FOR UPDATE` по строке сеанса. Конкурирующие резервирования
//!     одного сеанса ждут друг друга, и следующее видит уже закоммиченные места.
//! 2.  Частичный уникальный индекс `(show_id, seat_code) WHERE is_active` как
//!     страховка на уровне хранилища, если кто-то пишет в обход этого модуля.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    booking::{BOOKING_COLUMNS, SEAT_COLUMNS},
    Booking, BookingDetails, BookingSeat, BookingStatus, ShowVenue,
};
use crate::services::{availability, parking, seat_code};

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub show_id: i64,
    pub user_id: i64,
    pub seat_codes: Vec<String>,
    pub payment_method: String,
    pub has_parking: bool,
    pub vehicle_type: Option<String>,
}

/// Результат резервирования, поля совпадают с ответом API.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub booking: BookingDetails,
    pub seats: Vec<BookingSeat>,
    /// Итог: места + парковка
    pub subtotal: f64,
    pub seat_subtotal: f64,
    pub parking_fee: f64,
}

#[derive(Clone)]
pub struct ReservationService {
    db: Database,
}

impl ReservationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn reserve(&self, req: ReservationRequest) -> BookingResult<Reservation> {
        let mut tx = self.db.pool.begin().await?;

        // 1. Сеанс + зал + кинотеатр, с блокировкой строки сеанса
        let venue = ShowVenue::find_for_update(req.show_id, &mut *tx)
            .await?
            .ok_or(BookingError::NotFound("Show"))?;

        // 2. Коды мест
        let codes = canonical_codes(&req.seat_codes, &venue)?;

        // 3. Парковка. Без нее тип транспорта игнорируется
        let vehicle = if req.has_parking {
            Some(parking::parse_vehicle(req.vehicle_type.as_deref())?)
        } else {
            None
        };
        let parking_fee = match vehicle {
            Some(vehicle) => parking::allocate_parking(&mut *tx, &venue, vehicle).await?,
            None => 0.0,
        };

        // 4. Конфликты с активными бронями
        let occupied = availability::occupied_seats(&mut *tx, venue.show_id).await?;
        if let Some(code) = availability::first_conflict(&codes, &occupied) {
            debug!("seat {} of show {} is already held", code, venue.show_id);
            return Err(BookingError::Conflict(format!(
                "Seat {code} already booked by another active booking."
            )));
        }

        // 5. Суммы
        let seat_subtotal = codes.len() as f64 * venue.price;
        let total = seat_subtotal + parking_fee;

        // 6. Бронь
        let insert_booking = format!(
            "INSERT INTO bookings
                (user_id, show_id, seats_count, total_amount, status, payment_method,
                 has_parking, vehicle_type, parking_fee)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&insert_booking)
            .bind(req.user_id)
            .bind(venue.show_id)
            .bind(codes.len() as i32)
            .bind(total)
            .bind(BookingStatus::Pending.as_str())
            .bind(req.payment_method.trim())
            .bind(vehicle.is_some())
            .bind(vehicle.map(|v| v.as_str()).unwrap_or_default())
            .bind(parking_fee)
            .fetch_one(&mut *tx)
            .await?;

        // 7. Места брони
        let insert_seat = format!(
            "INSERT INTO booking_seats (booking_id, show_id, seat_code, price, is_active)
             VALUES ($1, $2, $3, $4, TRUE)
             RETURNING {SEAT_COLUMNS}"
        );
        let mut seats = Vec::with_capacity(codes.len());
        for code in &codes {
            let seat = sqlx::query_as::<_, BookingSeat>(&insert_seat)
                .bind(booking.id)
                .bind(venue.show_id)
                .bind(code)
                .bind(venue.price)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| BookingError::from_seat_insert(e, code))?;
            seats.push(seat);
        }

        let details = BookingDetails::load(&mut *tx, booking).await?;

        // 8. Коммит
        tx.commit().await?;

        info!(
            "Booking {} created for show {}: seats={:?}, parking={}, total={:.2}",
            details.booking.id,
            details.booking.show_id,
            codes,
            vehicle.map(|v| v.as_str()).unwrap_or("none"),
            total
        );

        Ok(Reservation {
            booking: details,
            seats,
            subtotal: total,
            seat_subtotal,
            parking_fee,
        })
    }
}

/// Проверяет все коды по геометрии зала и отсеивает дубликаты.
fn canonical_codes(raw: &[String], venue: &ShowVenue) -> BookingResult<Vec<String>> {
    if raw.is_empty() {
        return Err(BookingError::Validation("At least one seat code is required".to_string()));
    }
    let grid = venue.grid();
    let mut seen = HashSet::with_capacity(raw.len());
    let mut codes = Vec::with_capacity(raw.len());
    for code in raw {
        let canonical = seat_code::validate_seat_code(code.trim(), venue.seats_total, &grid)?;
        if !seen.insert(canonical.clone()) {
            return Err(BookingError::Validation(format!("Duplicate seat code: {canonical}")));
        }
        codes.push(canonical);
    }
    Ok(codes)
}
