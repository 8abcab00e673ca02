use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub booking: BookingConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub seat_map_ttl_secs: u64,
}

// Настройки JWT (только проверка, токены выдает сервис авторизации)
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Параметры удержания мест и фоновой очистки.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Сколько секунд бронь может висеть в `pending`. 0 - без ограничения.
    pub pending_hold_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub sweep_batch_size: i64,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_seat_map_cache: bool,
    pub enable_hold_sweeper: bool,
}

fn var_or<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} has an invalid value"))
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

// Redis нужен только кешу схем зала
fn redis_url(cache_enabled: bool, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(url) => Ok(url),
        None if cache_enabled => anyhow::bail!("REDIS_URL must be set when ENABLE_SEAT_MAP_CACHE is on"),
        None => Ok(String::new()),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let features = FeatureFlags {
            enable_seat_map_cache: var_or("ENABLE_SEAT_MAP_CACHE", "true")?,
            enable_hold_sweeper: var_or("ENABLE_HOLD_SWEEPER", "true")?,
        };

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("PORT", "8000")?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_booking=debug,tower_http=debug".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: var_or("DB_POOL_SIZE", "20")?,
                acquire_timeout_secs: var_or("DB_ACQUIRE_TIMEOUT_SECS", "5")?,
            },
            redis: RedisConfig {
                url: redis_url(features.enable_seat_map_cache, env::var("REDIS_URL").ok())?,
                seat_map_ttl_secs: var_or("SEAT_MAP_CACHE_TTL_SECS", "30")?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
            },
            booking: BookingConfig {
                pending_hold_timeout_secs: var_or("PENDING_HOLD_TIMEOUT_SECS", "900")?,
                sweep_interval_secs: var_or("HOLD_SWEEP_INTERVAL_SECS", "60")?,
                sweep_batch_size: var_or("HOLD_SWEEP_BATCH_SIZE", "200")?,
            },
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_or_falls_back_to_default() {
        let value: u64 = var_or("CINEMA_BOOKING_TEST_UNSET_VAR", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn redis_url_is_required_only_for_the_cache() {
        assert!(redis_url(true, None).is_err());
        assert_eq!(redis_url(false, None).unwrap(), "");
        assert_eq!(redis_url(true, Some("redis://cache:6379".into())).unwrap(), "redis://cache:6379");
    }

    #[test]
    fn var_or_rejects_garbage() {
        let res: anyhow::Result<u16> = var_or("CINEMA_BOOKING_TEST_UNSET_PORT", "not-a-port");
        assert!(res.is_err());
    }
}
