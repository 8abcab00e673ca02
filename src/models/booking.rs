use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{Payment, ShowSummary, User};

pub const BOOKING_COLUMNS: &str = "id, user_id, show_id, seats_count, total_amount::FLOAT8 AS total_amount, \
     status, payment_method, has_parking, vehicle_type, parking_fee::FLOAT8 AS parking_fee, \
     created_at, updated_at";

pub const SEAT_COLUMNS: &str = "id, booking_id, show_id, seat_code, price::FLOAT8 AS price, is_active, created_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub show_id: i64,
    pub seats_count: i32,
    pub total_amount: f64,
    pub status: String,
    pub payment_method: String,
    pub has_parking: bool,
    pub vehicle_type: String,
    pub parking_fee: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct BookingSeat {
    pub id: i64,
    pub booking_id: i64,
    pub show_id: i64,
    pub seat_code: String,
    pub price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Бронь со всеми связями, как ее отдает API.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: Option<User>,
    pub show: Option<ShowSummary>,
    pub seats: Vec<BookingSeat>,
    pub payment: Option<Payment>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::parse(&self.status)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<Booking>, sqlx::Error> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// То же, что `find_by_id`, но с блокировкой строки до конца транзакции.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<Booking>, sqlx::Error> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_user<'e, E: PgExecutor<'e>>(user_id: i64, executor: E) -> Result<Vec<Booking>, sqlx::Error> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Booking>(&sql)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    pub async fn list_all<'e, E: PgExecutor<'e>>(status: Option<&str>, executor: E) -> Result<Vec<Booking>, sqlx::Error> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(status)
            .fetch_all(executor)
            .await
    }
}

impl BookingDetails {
    /// Догружает связи брони: пользователя, сеанс, места и платеж.
    pub async fn load(conn: &mut PgConnection, booking: Booking) -> Result<BookingDetails, sqlx::Error> {
        let user = User::find_by_id(booking.user_id, &mut *conn).await?;
        let show = ShowSummary::find_by_id(booking.show_id, &mut *conn).await?;
        let seats = BookingSeat::list_for_booking(booking.id, &mut *conn).await?;
        let payment = Payment::find_by_booking(booking.id, &mut *conn).await?;
        Ok(BookingDetails { booking, user, show, seats, payment })
    }
}

impl BookingSeat {
    pub async fn list_for_booking<'e, E: PgExecutor<'e>>(booking_id: i64, executor: E) -> Result<Vec<BookingSeat>, sqlx::Error> {
        let sql = format!("SELECT {SEAT_COLUMNS} FROM booking_seats WHERE booking_id = $1 ORDER BY id");
        sqlx::query_as::<_, BookingSeat>(&sql)
            .bind(booking_id)
            .fetch_all(executor)
            .await
    }
}

/// Статус брони. Администратор может выставить произвольную строку,
/// поэтому кроме известных статусов есть `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    /// Статусы, которые держат места.
    pub const ACTIVE: [&'static str; 2] = ["pending", "confirmed"];

    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "pending" => BookingStatus::Pending,
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Bike,
}

impl VehicleType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "car" => Some(VehicleType::Car),
            "bike" => Some(VehicleType::Bike),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
