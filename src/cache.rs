use crate::redis_client::RedisClient;
use crate::services::seat_map::SeatMap;
use redis::AsyncCommands;
use tracing::{debug, warn};

/// Кеш схем зала в Redis. Источник истины - БД, кеш только ускоряет чтение,
/// поэтому любая ошибка Redis означает "промах", а не отказ.
///
/// Схема лежит под ключом с поколением сеанса. Инвалидация увеличивает
/// поколение, и запись, прочитанная из БД до инвалидации, попадает
/// в уже никому не нужный ключ.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    seat_map_ttl_secs: u64,
}

fn generation_key(show_id: i64) -> String {
    format!("seatmap:{}:gen", show_id)
}

fn seat_map_key(show_id: i64, generation: u64) -> String {
    format!("seatmap:{}:{}", show_id, generation)
}

impl CacheService {
    pub fn new(redis: RedisClient, seat_map_ttl_secs: u64) -> Self {
        Self { redis, seat_map_ttl_secs }
    }

    /// Текущее поколение схемы сеанса. Читать до загрузки схемы из БД.
    /// `None` - Redis недоступен, кешировать не нужно.
    pub async fn seat_map_generation(&self, show_id: i64) -> Option<u64> {
        let mut conn = self.redis.conn.clone();
        let res: Result<Option<u64>, _> = conn.get(generation_key(show_id)).await;
        match res {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                warn!("seat map generation read failed for show {}: {:?}", show_id, e);
                None
            }
        }
    }

    pub async fn get_seat_map(&self, show_id: i64, generation: u64) -> Option<SeatMap> {
        match self.get_seat_map_from_cache(show_id, generation).await {
            Ok(map) => map,
            Err(e) => {
                warn!("seat map cache read failed for show {}: {:?}", show_id, e);
                None
            }
        }
    }

    pub async fn save_seat_map(&self, generation: u64, map: &SeatMap) {
        if let Err(e) = self.save_seat_map_to_cache(generation, map).await {
            warn!("seat map cache write failed for show {}: {:?}", map.show_id, e);
        }
    }

    // Инвалидировать кеш мест
    pub async fn invalidate_seat_map(&self, show_id: i64) {
        let mut conn = self.redis.conn.clone();
        let res: Result<u64, _> = conn.incr(generation_key(show_id), 1).await;
        match res {
            Ok(generation) => debug!("Seat map of show {} moved to generation {}", show_id, generation),
            Err(e) => warn!("Failed to invalidate seat map cache for show {}: {:?}", show_id, e),
        }
    }

    // === Работа с кешем ===

    async fn get_seat_map_from_cache(
        &self,
        show_id: i64,
        generation: u64,
    ) -> Result<Option<SeatMap>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(seat_map_key(show_id, generation)).await?;
        match data {
            Some(json) => {
                let map = serde_json::from_str(&json).map_err(|_| {
                    redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
                })?;
                Ok(Some(map))
            }
            None => Ok(None),
        }
    }

    async fn save_seat_map_to_cache(&self, generation: u64, map: &SeatMap) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(map).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(seat_map_key(map.show_id, generation), data, self.seat_map_ttl_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_use_distinct_keys() {
        assert_eq!(seat_map_key(5, 0), "seatmap:5:0");
        assert_ne!(seat_map_key(5, 0), seat_map_key(5, 1));
        assert_ne!(generation_key(5), seat_map_key(5, 0));
    }
}
