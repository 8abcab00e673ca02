pub mod admin;
pub mod bookings;
pub mod payment;
pub mod seats;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(bookings::routes())
        .merge(seats::routes())
        .merge(payment::routes())
        .merge(admin::routes())
}
