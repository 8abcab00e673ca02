use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use chrono::{DateTime, Utc};

pub const PAYMENT_COLUMNS: &str = "id, booking_id, method, provider_tx, amount::FLOAT8 AS amount, \
     status, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub method: String,
    pub provider_tx: String,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Initiated,
    Completed,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Expired => "expired",
        }
    }
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(PaymentStatus::Completed.as_str())
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<Payment>, sqlx::Error> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update<'e, E: PgExecutor<'e>>(id: i64, executor: E) -> Result<Option<Payment>, sqlx::Error> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_booking<'e, E: PgExecutor<'e>>(booking_id: i64, executor: E) -> Result<Option<Payment>, sqlx::Error> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(booking_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_user<'e, E: PgExecutor<'e>>(user_id: i64, executor: E) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            "SELECT p.id, p.booking_id, p.method, p.provider_tx, p.amount::FLOAT8 AS amount,
                    p.status, p.created_at, p.updated_at
             FROM payments p
             JOIN bookings b ON b.id = p.booking_id
             WHERE b.user_id = $1
             ORDER BY p.created_at DESC, p.id DESC"
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
