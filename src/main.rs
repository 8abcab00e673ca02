use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use cinema_booking::{config::Config, controllers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let fmt_layer = if config.app.log_format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(fmt_layer)
        .init();

    info!("Starting cinema booking API ({})", config.app.environment);

    let app_state = AppState::new(config.clone()).await?;

    // --- Background tasks ---

    #[cfg(feature = "hold-sweeper")]
    if config.features.enable_hold_sweeper {
        let sweeper = cinema_booking::services::cleanup::CleanupService::new(
            app_state.db.clone(),
            app_state.cache.clone(),
            config.booking.clone(),
        );
        tokio::spawn(sweeper.run());
    }

    // --- Web server ---

    let app = Router::new()
        .route("/", get(|| async { "Cinema booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .route("/ready", get(readiness))
        .nest("/api", controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// Готовность: БД обязательна, Redis только если включен кеш
async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db.pool).await.is_ok();
    let redis_ok = match &state.redis {
        Some(redis) => redis.ping().await,
        None => true,
    };

    let status = if db_ok && redis_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "database": db_ok, "redis": redis_ok })))
}
