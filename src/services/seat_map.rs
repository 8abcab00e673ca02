//! Схема зала для сеанса: какие места свободны, удержаны или проданы.
//!
//! Строится тем же запросом по активным броням, что и проверка занятости.
//! Места неоплаченных `pending` броней показываются как `held` и недоступны
//! другим покупателям.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::Database;
use crate::error::{BookingError, BookingResult};
use crate::models::{BookingStatus, ShowVenue};
use crate::services::availability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Held,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatCell {
    pub seat_code: String,
    pub status: SeatState,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRow {
    pub row: String,
    pub seats: Vec<SeatCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatMap {
    pub show_id: i64,
    pub hall: String,
    pub price: f64,
    pub seats_total: i32,
    pub seat_layout: Vec<SeatRow>,
}

impl SeatMap {
    pub fn count(&self, state: SeatState) -> usize {
        self.seat_layout
            .iter()
            .flat_map(|row| row.seats.iter())
            .filter(|seat| seat.status == state)
            .count()
    }
}

pub async fn load_seat_map(db: &Database, show_id: i64) -> BookingResult<SeatMap> {
    let venue = ShowVenue::find(show_id, &db.pool)
        .await?
        .ok_or(BookingError::NotFound("Show"))?;
    let holds = availability::seat_holds(&db.pool, show_id).await?;
    Ok(assemble(&venue, &holds))
}

fn assemble(venue: &ShowVenue, holds: &HashMap<String, BookingStatus>) -> SeatMap {
    let seat_layout = venue
        .grid()
        .layout(venue.seats_total)
        .into_iter()
        .map(|(row, codes)| SeatRow {
            row: row.to_string(),
            seats: codes
                .into_iter()
                .map(|code| {
                    let status = match holds.get(&code) {
                        Some(BookingStatus::Confirmed) => SeatState::Booked,
                        Some(_) => SeatState::Held,
                        None => SeatState::Available,
                    };
                    SeatCell { seat_code: code, status, price: venue.price }
                })
                .collect(),
        })
        .collect();

    SeatMap {
        show_id: venue.show_id,
        hall: venue.screen_name.clone(),
        price: venue.price,
        seats_total: venue.seats_total,
        seat_layout,
    }
}
