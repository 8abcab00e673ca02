//! Учет парковочных мест по типу транспорта.

use sqlx::PgExecutor;
use tracing::debug;

use crate::error::{BookingError, BookingResult};
use crate::models::{ShowVenue, VehicleType};
use crate::services::availability::active_statuses;

/// Сколько активных броней сеанса уже заняли парковку для данного типа транспорта.
pub async fn active_parking_count<'e, E: PgExecutor<'e>>(
    executor: E,
    show_id: i64,
    vehicle: VehicleType,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM bookings
        WHERE show_id = $1
          AND has_parking
          AND vehicle_type = $2
          AND status = ANY($3)
        "#
    )
    .bind(show_id)
    .bind(vehicle.as_str())
    .bind(active_statuses())
    .fetch_one(executor)
    .await
}

/// Проверяет, что парковка доступна и не заполнена, и возвращает тариф.
///
/// Должна вызываться в той же транзакции и под той же блокировкой сеанса,
/// что и проверка мест.
pub async fn allocate_parking<'e, E: PgExecutor<'e>>(
    executor: E,
    venue: &ShowVenue,
    vehicle: VehicleType,
) -> BookingResult<f64> {
    if !venue.parking_available {
        return Err(BookingError::Validation(
            "Parking not available at this theatre".to_string(),
        ));
    }

    let terms = venue.parking_terms(vehicle);
    if terms.capacity > 0 {
        let taken = active_parking_count(executor, venue.show_id, vehicle).await?;
        debug!(
            "parking for show {}: {} {} of {} taken",
            venue.show_id, taken, vehicle, terms.capacity
        );
        if taken >= terms.capacity as i64 {
            return Err(BookingError::Conflict(format!(
                "Parking full for vehicle type {vehicle}"
            )));
        }
    }

    Ok(terms.fee)
}

/// Разбирает тип транспорта из запроса.
pub fn parse_vehicle(raw: Option<&str>) -> BookingResult<VehicleType> {
    raw.and_then(VehicleType::parse)
        .ok_or_else(|| BookingError::Validation("Invalid vehicle type for parking".to_string()))
}
