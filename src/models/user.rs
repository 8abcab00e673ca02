use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use chrono::{DateTime, Utc};

pub const ROLE_ADMIN: &str = "admin";

// Пользователь приходит от сервиса авторизации, здесь только чтение
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, role, created_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
