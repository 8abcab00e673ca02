use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::debug;

use crate::{error::BookingResult, services::seat_map, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shows/{id}/seats", get(get_seat_map))
}

// GET /api/shows/{id}/seats
pub async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> BookingResult<impl IntoResponse> {
    // Поколение читается до загрузки из БД, иначе можно закешировать
    // схему, устаревшую из-за параллельной брони
    let cached = match &state.cache {
        Some(cache) => cache
            .seat_map_generation(show_id)
            .await
            .map(|generation| (cache, generation)),
        None => None,
    };

    if let Some((cache, generation)) = cached {
        if let Some(map) = cache.get_seat_map(show_id, generation).await {
            debug!("seat map of show {} served from cache", show_id);
            return Ok(Json(map));
        }
    }

    let map = seat_map::load_seat_map(&state.db, show_id).await?;

    if let Some((cache, generation)) = cached {
        cache.save_seat_map(generation, &map).await;
    }
    Ok(Json(map))
}
