//! Фоновая очистка зависших `pending` броней.
//!
//! Бронь без подтвержденной оплаты держит места бесконечно, поэтому брони старше
//! `pending_hold_timeout_secs` отменяются, а их места освобождаются.
//! `FOR UPDATE SKIP LOCKED` позволяет запускать очистку на нескольких репликах.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cache::CacheService;
use crate::config::BookingConfig;
use crate::database::Database;
use crate::models::{BookingStatus, PaymentStatus};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub cancelled_bookings: Vec<i64>,
    pub affected_shows: Vec<i64>,
    pub released_seats: u64,
    pub expired_payments: u64,
}

pub struct CleanupService {
    db: Database,
    cache: Option<CacheService>,
    config: BookingConfig,
}

impl CleanupService {
    pub fn new(db: Database, cache: Option<CacheService>, config: BookingConfig) -> Self {
        Self { db, cache, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.pending_hold_timeout_secs > 0
    }

    /// Бесконечный цикл очистки, запускается в отдельной задаче.
    pub async fn run(self) {
        if !self.is_enabled() {
            info!("🧹 Pending hold sweeper disabled (timeout = 0)");
            return;
        }

        info!(
            "🧹 Pending hold sweeper started: timeout={}s, interval={}s",
            self.config.pending_hold_timeout_secs, self.config.sweep_interval_secs
        );
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs.max(1)));
        loop {
            ticker.tick().await;
            match self.sweep_expired_holds().await {
                Ok(report) if report.cancelled_bookings.len() as i64 >= self.config.sweep_batch_size => {
                    self.report_backlog().await;
                }
                Ok(_) => {}
                Err(e) => error!("🧹 Pending hold sweep failed: {:?}", e),
            }
        }
    }

    /// Один проход очистки: отменяет одну пачку просроченных броней.
    pub async fn sweep_expired_holds(&self) -> Result<SweepReport, sqlx::Error> {
        let mut tx = self.db.pool.begin().await?;

        let expired: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM bookings
                WHERE status = $2
                  AND created_at < NOW() - make_interval(secs => $3)
                ORDER BY created_at
                LIMIT $4
                FOR UPDATE SKIP LOCKED
            )
            AND status = $2
            RETURNING id, show_id
            "#
        )
        .bind(BookingStatus::Cancelled.as_str())
        .bind(BookingStatus::Pending.as_str())
        .bind(self.config.pending_hold_timeout_secs as f64)
        .bind(self.config.sweep_batch_size.max(1))
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            tx.commit().await?;
            return Ok(SweepReport::default());
        }

        let booking_ids: Vec<i64> = expired.iter().map(|(id, _)| *id).collect();

        let released_seats = sqlx::query(
            "UPDATE booking_seats SET is_active = FALSE WHERE booking_id = ANY($1) AND is_active"
        )
        .bind(&booking_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let expired_payments = sqlx::query(
            "UPDATE payments SET status = $1, updated_at = NOW()
             WHERE booking_id = ANY($2) AND status = $3"
        )
        .bind(PaymentStatus::Expired.as_str())
        .bind(&booking_ids)
        .bind(PaymentStatus::Initiated.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        let affected_shows: Vec<i64> = expired
            .iter()
            .map(|(_, show_id)| *show_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if let Some(cache) = &self.cache {
            for show_id in &affected_shows {
                cache.invalidate_seat_map(*show_id).await;
            }
        }

        info!(
            "🧹 {} expired pending bookings cancelled, {} seats released, {} payments expired",
            booking_ids.len(), released_seats, expired_payments
        );

        Ok(SweepReport {
            cancelled_bookings: booking_ids,
            affected_shows,
            released_seats,
            expired_payments,
        })
    }

    // Пачка заполнена целиком - просроченные брони копятся быстрее, чем чистятся
    async fn report_backlog(&self) {
        match self.pending_expired_count().await {
            Ok(0) => {}
            Ok(left) => warn!("🧹 {} expired pending bookings still waiting for the next sweep", left),
            Err(e) => error!("🧹 Failed to count expired pending bookings: {:?}", e),
        }
    }

    /// Сколько просроченных броней ждет очистки.
    pub async fn pending_expired_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE status = $1 AND created_at < NOW() - make_interval(secs => $2)"
        )
        .bind(BookingStatus::Pending.as_str())
        .bind(self.config.pending_hold_timeout_secs as f64)
        .fetch_one(&self.db.pool)
        .await
    }
}
