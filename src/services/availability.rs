//! Чтение занятых мест сеанса.
//!
//! Занятость всегда считается живым запросом по активным броням,
//! `shows.seats_booked` для этого не используется.

use sqlx::PgExecutor;
use std::collections::{HashMap, HashSet};

use crate::models::BookingStatus;

pub fn active_statuses() -> Vec<String> {
    BookingStatus::ACTIVE.iter().map(|s| s.to_string()).collect()
}

/// Коды мест, которые держат активные брони сеанса.
/// Внутри резервирования вызывается после блокировки строки сеанса.
pub async fn occupied_seats<'e, E: PgExecutor<'e>>(
    executor: E,
    show_id: i64,
) -> Result<HashSet<String>, sqlx::Error> {
    let codes: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT bs.seat_code
        FROM booking_seats bs
        JOIN bookings b ON b.id = bs.booking_id
        WHERE bs.show_id = $1 AND b.status = ANY($2)
        "#
    )
    .bind(show_id)
    .bind(active_statuses())
    .fetch_all(executor)
    .await?;

    Ok(codes.into_iter().collect())
}

/// Занятые места вместе со статусом брони, которая их держит. Нужно для схемы зала.
pub async fn seat_holds<'e, E: PgExecutor<'e>>(
    executor: E,
    show_id: i64,
) -> Result<HashMap<String, BookingStatus>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT bs.seat_code, b.status
        FROM booking_seats bs
        JOIN bookings b ON b.id = bs.booking_id
        WHERE bs.show_id = $1 AND b.status = ANY($2)
        "#
    )
    .bind(show_id)
    .bind(active_statuses())
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(code, status)| (code, BookingStatus::parse(&status)))
        .collect())
}

/// Первый запрошенный код (в порядке запроса), который уже занят.
pub fn first_conflict<'a>(requested: &'a [String], occupied: &HashSet<String>) -> Option<&'a str> {
    requested
        .iter()
        .find(|code| occupied.contains(code.as_str()))
        .map(String::as_str)
}
