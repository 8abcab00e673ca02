use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use chrono::{DateTime, Utc};

use crate::models::VehicleType;
use crate::services::seat_code::SeatGrid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub screen_id: i64,
    pub start_time: DateTime<Utc>,
    pub language: String,
    pub price: f64,
    pub seats_total: i32,
    pub seats_booked: i32,
}

impl Show {
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(
            "SELECT id, movie_id, screen_id, start_time, language, price::FLOAT8 AS price,
                    seats_total, seats_booked
             FROM shows WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}

/// Краткая информация о сеансе для ответов по броням.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowSummary {
    pub id: i64,
    pub movie_title: String,
    pub start_time: DateTime<Utc>,
    pub price: f64,
    pub screen_name: String,
    pub theatre_name: String,
}

impl ShowSummary {
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<ShowSummary>, sqlx::Error> {
        sqlx::query_as::<_, ShowSummary>(
            r#"
            SELECT s.id, m.title AS movie_title, s.start_time, s.price::FLOAT8 AS price,
                   sc.name AS screen_name, t.name AS theatre_name
            FROM shows s
            JOIN movies m ON m.id = s.movie_id
            JOIN screens sc ON sc.id = s.screen_id
            JOIN theatres t ON t.id = sc.theatre_id
            WHERE s.id = $1
            "#
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}

/// Сеанс вместе с залом и кинотеатром: цена, вместимость, геометрия, парковка.
#[derive(Debug, Clone, FromRow)]
pub struct ShowVenue {
    pub show_id: i64,
    pub price: f64,
    pub seats_total: i32,
    pub screen_name: String,
    pub seat_rows: String,
    pub seats_per_row: i32,
    pub parking_available: bool,
    pub car_parking_fee: f64,
    pub bike_parking_fee: f64,
    pub car_parking_capacity: i32,
    pub bike_parking_capacity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkingTerms {
    pub fee: f64,
    /// 0 - без ограничения
    pub capacity: i32,
}

const VENUE_SELECT: &str = r#"
    SELECT s.id AS show_id, s.price::FLOAT8 AS price, s.seats_total,
           sc.name AS screen_name, sc.seat_rows, sc.seats_per_row,
           t.parking_available,
           t.car_parking_fee::FLOAT8 AS car_parking_fee,
           t.bike_parking_fee::FLOAT8 AS bike_parking_fee,
           t.car_parking_capacity, t.bike_parking_capacity
    FROM shows s
    JOIN screens sc ON sc.id = s.screen_id
    JOIN theatres t ON t.id = sc.theatre_id
    WHERE s.id = $1
"#;

impl ShowVenue {
    pub async fn find<'e, E: PgExecutor<'e>>(show_id: i64, executor: E) -> Result<Option<ShowVenue>, sqlx::Error> {
        sqlx::query_as::<_, ShowVenue>(VENUE_SELECT)
            .bind(show_id)
            .fetch_optional(executor)
            .await
    }

    /// Загружает сеанс и берет блокировку строки `shows` до конца транзакции.
    /// Все резервирования одного сеанса выстраиваются в очередь на этой блокировке.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(show_id: i64, executor: E) -> Result<Option<ShowVenue>, sqlx::Error> {
        let sql = format!("{VENUE_SELECT} FOR UPDATE OF s");
        sqlx::query_as::<_, ShowVenue>(&sql)
            .bind(show_id)
            .fetch_optional(executor)
            .await
    }

    pub fn grid(&self) -> SeatGrid {
        SeatGrid::new(&self.seat_rows, self.seats_per_row.max(0) as u32)
    }

    pub fn parking_terms(&self, vehicle: VehicleType) -> ParkingTerms {
        match vehicle {
            VehicleType::Car => ParkingTerms { fee: self.car_parking_fee, capacity: self.car_parking_capacity },
            VehicleType::Bike => ParkingTerms { fee: self.bike_parking_fee, capacity: self.bike_parking_capacity },
        }
    }
}
