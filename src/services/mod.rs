pub mod seat_code;
pub mod availability;
pub mod parking;
pub mod reservation;
pub mod payment;
pub mod admin;
pub mod seat_map;
pub mod cleanup;
