pub mod config;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod error;
pub mod services;

use std::sync::Arc;

use services::{
    admin::AdminBookingService, payment::PaymentService, reservation::ReservationService,
};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: Option<redis_client::RedisClient>,
    pub cache: Option<cache::CacheService>,
    pub config: config::Config,
    pub reservations: ReservationService,
    pub payments: PaymentService,
    pub admin: AdminBookingService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(
            &config.database.url,
            config.database.pool_size,
            config.database.acquire_timeout_secs,
        )
        .await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let redis = if config.features.enable_seat_map_cache {
            let redis = redis_client::RedisClient::connect(&config.redis.url).await?;
            tracing::info!("Redis connected");
            Some(redis)
        } else {
            tracing::info!("Seat map cache disabled");
            None
        };

        Ok(Arc::new(Self::with_parts(db, redis, config)))
    }

    /// Собирает состояние из готовых подключений (используется и в тестах).
    pub fn with_parts(
        db: database::Database,
        redis: Option<redis_client::RedisClient>,
        config: config::Config,
    ) -> Self {
        let cache = redis
            .clone()
            .map(|r| cache::CacheService::new(r, config.redis.seat_map_ttl_secs));
        Self {
            reservations: ReservationService::new(db.clone()),
            payments: PaymentService::new(db.clone()),
            admin: AdminBookingService::new(db.clone()),
            db,
            redis,
            cache,
            config,
        }
    }

    /// Сбрасывает кеш схемы зала после любых изменений броней сеанса.
    pub async fn invalidate_show(&self, show_id: i64) {
        if let Some(cache) = &self.cache {
            cache.invalidate_seat_map(show_id).await;
        }
    }
}
